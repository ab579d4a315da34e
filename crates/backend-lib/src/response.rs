//! Response model: renders an [`Outcome`] into the wire envelope.
use balance_gateway_common::ResponseEnvelope;

use crate::dispatcher::Outcome;

/// Build the response envelope for an outcome
pub fn render(outcome: &Outcome) -> ResponseEnvelope {
    let mut envelope = ResponseEnvelope::new(outcome.code.code());
    for (name, value) in &outcome.extras {
        envelope.add_extra(name.as_str(), value.as_str());
    }
    envelope
}

/// Render an outcome straight to an XML document
pub fn render_xml(outcome: &Outcome) -> Result<String, quick_xml::SeError> {
    render(outcome).to_xml()
}
