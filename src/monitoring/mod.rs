/*!
 * Monitoring
 * Tracing subscriber setup and spans
 */

mod tracer;

pub use tracer::{init_tracing, signal_span, TRACE_JSON_ENV};
