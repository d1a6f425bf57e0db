mod test_churn_participants;
mod test_third_peer_queued;
