mod churn_simulator;

pub use churn_simulator::*;
