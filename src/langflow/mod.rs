pub mod client;
pub mod extract;

pub use client::{FlowInvoker, FlowTransport, HttpFlowTransport, RawResponse, TransportResponse};
pub use extract::{ExtractedAnswer, extract_answer, strip_code_fences};
