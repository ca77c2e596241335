use std::any::Any;

use tokio::task::JoinError;

/// Human readable reason for a failed spawned task: the panic message when there is one.
pub(crate) fn failure_reason(e: JoinError) -> String {
    match e.try_into_panic() {
        Ok(payload) => panic_message(payload.as_ref()),
        Err(e) => e.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
