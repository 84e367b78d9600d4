// Macros file - tracing macros are referenced by full path inside the macro bodies

/// Structured logging macros with consistent field names across the client.
///
/// - `operation` names the service call (`generate_quiz`, `list_history`, ...)
/// - `machine` names the state machine (`generation`, `history_list`, `history_modal`)
/// - `quiz_id`, `url`, `count` carry the request subject

// ============================================================================
// Service Request Logging Macros
// ============================================================================

/// Log the start of an outbound service request
#[macro_export]
macro_rules! log_request_start {
    ($operation:expr, quiz_id = $quiz_id:expr) => {
        tracing::debug!(
            operation = $operation,
            quiz_id = $quiz_id,
            "Service request started"
        );
    };
    ($operation:expr, url = $url:expr, num_questions = $count:expr) => {
        tracing::info!(
            operation = $operation,
            url = %$url,
            num_questions = $count,
            "Service request started"
        );
    };
    ($operation:expr) => {
        tracing::debug!(operation = $operation, "Service request started");
    };
}

/// Log successful completion of a service request
#[macro_export]
macro_rules! log_request_success {
    ($operation:expr, quiz_id = $quiz_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            quiz_id = $quiz_id,
            "Service request completed: {}", $msg
        );
    };
    ($operation:expr, count = $count:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            count = $count,
            "Service request completed: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::info!(operation = $operation, "Service request completed: {}", $msg);
    };
}

/// Log a failed service request as seen by an orchestrator
#[macro_export]
macro_rules! log_request_error {
    ($operation:expr, quiz_id = $quiz_id:expr, error = $error:expr) => {
        tracing::warn!(
            operation = $operation,
            quiz_id = $quiz_id,
            error = %$error,
            "Service request failed"
        );
    };
    ($operation:expr, error = $error:expr) => {
        tracing::warn!(
            operation = $operation,
            error = %$error,
            "Service request failed"
        );
    };
}

// ============================================================================
// State Machine Logging Macros
// ============================================================================

/// Log a state machine transition
#[macro_export]
macro_rules! log_transition {
    ($machine:expr, from = $from:expr, to = $to:expr) => {
        tracing::debug!(
            machine = $machine,
            from = $from,
            to = $to,
            "State transition"
        );
    };
    ($machine:expr, from = $from:expr, to = $to:expr, epoch = $epoch:expr) => {
        tracing::debug!(
            machine = $machine,
            from = $from,
            to = $to,
            epoch = $epoch,
            "State transition"
        );
    };
}

/// Log a result dropped because interest in it was withdrawn or superseded
#[macro_export]
macro_rules! log_stale_discard {
    ($machine:expr, ticket = $ticket:expr, current = $current:expr) => {
        tracing::info!(
            machine = $machine,
            ticket = $ticket,
            current_epoch = $current,
            "Discarding stale response"
        );
    };
}

/// Log a user action refused by a state machine
#[macro_export]
macro_rules! log_rejected {
    ($machine:expr, $msg:expr) => {
        tracing::warn!(machine = $machine, "Action rejected: {}", $msg);
    };
}

// ============================================================================
// System Event Logging Macros
// ============================================================================

/// Log system startup and shutdown events
#[macro_export]
macro_rules! log_system_event {
    (startup, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "startup",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (shutdown, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "shutdown",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (config, $msg:expr) => {
        tracing::info!(event_type = "configuration", "System event: {}", $msg);
    };
}

// ============================================================================
// Validation Logging Macros
// ============================================================================

/// Log validation results consistently
#[macro_export]
macro_rules! log_validation {
    (success, $component:expr, $msg:expr) => {
        tracing::debug!(
            event_type = "validation",
            component = $component,
            result = "success",
            "Validation completed: {}", $msg
        );
    };
    (failure, $component:expr, error = $error:expr) => {
        tracing::warn!(
            event_type = "validation",
            component = $component,
            result = "failure",
            error = %$error,
            "Validation failed"
        );
    };
}
