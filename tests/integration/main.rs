mod audit_test;
mod e2e_test;
mod simulate_test;
