mod test_failure_closes_session;
mod test_offer_answer_round_trip;
mod test_teardown;
