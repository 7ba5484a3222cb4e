use evs_compiler::{
    load_events_document, save_events_document, CodeGenerator, GenerationContext,
    InstructionRegistry,
};
use evs_core::{Diagnostic, EventNode, EventScriptError};

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSheet {
    pub events: Vec<EventNode>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSheet {
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds the event tree from an event-sheet document. Fails only
/// when the XML itself does not parse; structural gaps degrade to
/// diagnostics.
pub fn load_event_sheet(source: &str) -> Result<LoadedSheet, EventScriptError> {
    let loaded = load_events_document(source)?;
    Ok(LoadedSheet {
        events: loaded.events,
        diagnostics: loaded.diagnostics,
    })
}

pub fn save_event_sheet(events: &[EventNode]) -> String {
    save_events_document(events)
}

/// End to end: document in, target code plus merged load and
/// generation diagnostics out.
pub fn generate_sheet_code(
    source: &str,
    registry: &InstructionRegistry,
) -> Result<GeneratedSheet, EventScriptError> {
    let loaded = load_event_sheet(source)?;
    let generator = CodeGenerator::new(registry);
    let generated = generator.generate_code(&loaded.events, &GenerationContext::root());

    let mut diagnostics = loaded.diagnostics;
    diagnostics.extend(generated.diagnostics);
    Ok(GeneratedSheet {
        code: generated.code,
        diagnostics,
    })
}
