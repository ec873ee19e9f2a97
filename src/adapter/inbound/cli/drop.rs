//! Handler for the `drop` command.

use std::process::ExitCode;

use crate::port::OrderOperator;

/// Drop the collection and print the response body.
pub async fn execute(operator: &dyn OrderOperator) -> ExitCode {
    let response = operator.drop_orders().await;
    if response.is_success() {
        println!("{}", response.body);
        ExitCode::SUCCESS
    } else {
        eprintln!("{}", response.body);
        ExitCode::FAILURE
    }
}
