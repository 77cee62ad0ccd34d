//! Structured log helpers.
//!
//! Log lines carry a `component` field (node, announcer, registry, runtime)
//! so JSON output can be filtered per component.

/// Log an event scoped to a component.
#[macro_export]
macro_rules! log_event {
    ($level:ident, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log an event about one hosted module with standard fields.
#[macro_export]
macro_rules! log_module_event {
    ($level:ident, $component:expr, $msg:expr, $module_uid:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            module = %$module_uid,
            $($($field)*,)?
            $msg
        )
    };
}
