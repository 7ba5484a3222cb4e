use evs_core::{Diagnostic, EventNode, EventScriptError, Expression, Instruction};
use evs_parser::{parse_xml_document, XmlElement};

/// Result of loading an event-sheet document: the tree plus every
/// recoverable finding. A malformed record degrades locally; only
/// unparseable XML fails the load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedEvents {
    pub events: Vec<EventNode>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn load_events_document(source: &str) -> Result<LoadedEvents, EventScriptError> {
    let document = parse_xml_document(source)?;
    if document.root.name != "Events" {
        return Err(EventScriptError::with_span(
            "XML_ROOT_INVALID",
            format!("Expected <Events> root, got <{}>.", document.root.name),
            document.root.location,
        ));
    }

    let mut diagnostics = Vec::new();
    let events = load_events_list(&document.root, &mut diagnostics);
    Ok(LoadedEvents {
        events,
        diagnostics,
    })
}

fn load_events_list(list: &XmlElement, diagnostics: &mut Vec<Diagnostic>) -> Vec<EventNode> {
    let mut events = Vec::new();
    for child in &list.children {
        if child.name != "Event" {
            diagnostics.push(
                Diagnostic::warning(
                    "EVENT_RECORD_UNEXPECTED",
                    format!("Ignoring <{}> inside <Events>.", child.name),
                )
                .at(child.location.clone()),
            );
            continue;
        }

        let Some(kind) = child.attribute("kind") else {
            diagnostics.push(
                Diagnostic::error(
                    "EVENT_KIND_MISSING",
                    "Skipping <Event> without a kind attribute.",
                )
                .at(child.location.clone()),
            );
            continue;
        };

        match kind {
            "Standard" => events.push(EventNode::Standard {
                conditions: load_instructions(child, "Conditions", diagnostics),
                actions: load_instructions(child, "Actions", diagnostics),
                sub_events: load_sub_events(child, diagnostics),
            }),
            "Repeat" => events.push(EventNode::Repeat {
                repeat_expression: load_repeat_expression(child, diagnostics),
                conditions: load_instructions(child, "Conditions", diagnostics),
                actions: load_instructions(child, "Actions", diagnostics),
                sub_events: load_sub_events(child, diagnostics),
            }),
            "While" => events.push(EventNode::While {
                while_conditions: load_instructions(child, "WhileConditions", diagnostics),
                conditions: load_instructions(child, "Conditions", diagnostics),
                actions: load_instructions(child, "Actions", diagnostics),
                sub_events: load_sub_events(child, diagnostics),
            }),
            "Comment" => events.push(EventNode::Comment {
                text: load_comment_text(child, diagnostics),
            }),
            other => diagnostics.push(
                Diagnostic::error(
                    "EVENT_KIND_UNKNOWN",
                    format!("Skipping <Event> with unknown kind \"{other}\"."),
                )
                .at(child.location.clone()),
            ),
        }
    }
    events
}

fn load_instructions(
    event: &XmlElement,
    list_name: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Instruction> {
    let Some(list) = event.child(list_name) else {
        diagnostics.push(
            Diagnostic::warning(
                "EVENT_ELEMENT_MISSING",
                format!(
                    "No <{}> on a {} event; treating it as empty.",
                    list_name,
                    event.attribute("kind").unwrap_or("?")
                ),
            )
            .at(event.location.clone()),
        );
        return Vec::new();
    };

    let mut instructions = Vec::new();
    for record in list.children_named("Instruction") {
        let Some(name) = record.attribute("name") else {
            diagnostics.push(
                Diagnostic::error(
                    "INSTRUCTION_NAME_MISSING",
                    format!("Skipping <Instruction> without a name inside <{list_name}>."),
                )
                .at(record.location.clone()),
            );
            continue;
        };

        let negated = match record.attribute("negated") {
            None => false,
            Some("true") => true,
            Some("false") => false,
            Some(other) => {
                diagnostics.push(
                    Diagnostic::warning(
                        "ATTR_BOOL_INVALID",
                        format!(
                            "Attribute negated=\"{other}\" on \"{name}\" is not a boolean; assuming false."
                        ),
                    )
                    .at(record.location.clone()),
                );
                false
            }
        };

        // Verbatim: surrounding whitespace belongs to the formula
        // text, and the saver writes it back untouched.
        let parameters = record
            .children_named("Parameter")
            .map(|parameter| Expression::new(parameter.text.as_str()))
            .collect();

        instructions.push(Instruction {
            name: name.to_string(),
            parameters,
            negated,
        });
    }
    instructions
}

fn load_sub_events(event: &XmlElement, diagnostics: &mut Vec<Diagnostic>) -> Vec<EventNode> {
    // An absent <Events> simply means no sub-events.
    match event.child("Events") {
        Some(list) => load_events_list(list, diagnostics),
        None => Vec::new(),
    }
}

fn load_repeat_expression(event: &XmlElement, diagnostics: &mut Vec<Diagnostic>) -> Expression {
    match event.attribute("repeat") {
        Some(formula) => Expression::new(formula),
        None => {
            diagnostics.push(
                Diagnostic::warning(
                    "REPEAT_EXPRESSION_MISSING",
                    "Repeat event has no repeat attribute; substituting a zero count.",
                )
                .at(event.location.clone()),
            );
            Expression::new("0")
        }
    }
}

fn load_comment_text(event: &XmlElement, diagnostics: &mut Vec<Diagnostic>) -> String {
    match event.child("Comment") {
        Some(comment) => comment.text.clone(),
        None => {
            diagnostics.push(
                Diagnostic::warning(
                    "EVENT_ELEMENT_MISSING",
                    "Comment event has no <Comment> element; treating it as empty.",
                )
                .at(event.location.clone()),
            );
            String::new()
        }
    }
}

pub fn save_events_document(events: &[EventNode]) -> String {
    let mut output = String::new();
    output.push_str("<Events>\n");
    for event in events {
        write_event(&mut output, event, 1);
    }
    output.push_str("</Events>\n");
    output
}

fn write_event(output: &mut String, event: &EventNode, depth: usize) {
    let pad = indent(depth);
    match event {
        EventNode::Standard {
            conditions,
            actions,
            sub_events,
        } => {
            output.push_str(&format!("{pad}<Event kind=\"Standard\">\n"));
            write_instructions(output, "Conditions", conditions, depth + 1);
            write_instructions(output, "Actions", actions, depth + 1);
            write_sub_events(output, sub_events, depth + 1);
            output.push_str(&format!("{pad}</Event>\n"));
        }
        EventNode::Repeat {
            repeat_expression,
            conditions,
            actions,
            sub_events,
        } => {
            output.push_str(&format!(
                "{pad}<Event kind=\"Repeat\" repeat=\"{}\">\n",
                escape_attribute(repeat_expression.plain_string())
            ));
            write_instructions(output, "Conditions", conditions, depth + 1);
            write_instructions(output, "Actions", actions, depth + 1);
            write_sub_events(output, sub_events, depth + 1);
            output.push_str(&format!("{pad}</Event>\n"));
        }
        EventNode::While {
            while_conditions,
            conditions,
            actions,
            sub_events,
        } => {
            output.push_str(&format!("{pad}<Event kind=\"While\">\n"));
            write_instructions(output, "WhileConditions", while_conditions, depth + 1);
            write_instructions(output, "Conditions", conditions, depth + 1);
            write_instructions(output, "Actions", actions, depth + 1);
            write_sub_events(output, sub_events, depth + 1);
            output.push_str(&format!("{pad}</Event>\n"));
        }
        EventNode::Comment { text } => {
            output.push_str(&format!("{pad}<Event kind=\"Comment\">\n"));
            output.push_str(&format!(
                "{}<Comment>{}</Comment>\n",
                indent(depth + 1),
                escape_text(text)
            ));
            output.push_str(&format!("{pad}</Event>\n"));
        }
    }
}

fn write_instructions(
    output: &mut String,
    list_name: &str,
    instructions: &[Instruction],
    depth: usize,
) {
    let pad = indent(depth);
    if instructions.is_empty() {
        output.push_str(&format!("{pad}<{list_name} />\n"));
        return;
    }

    output.push_str(&format!("{pad}<{list_name}>\n"));
    let record_pad = indent(depth + 1);
    for instruction in instructions {
        let negated = if instruction.negated {
            " negated=\"true\""
        } else {
            ""
        };
        if instruction.parameters.is_empty() {
            output.push_str(&format!(
                "{record_pad}<Instruction name=\"{}\"{negated} />\n",
                escape_attribute(&instruction.name)
            ));
            continue;
        }

        output.push_str(&format!(
            "{record_pad}<Instruction name=\"{}\"{negated}>\n",
            escape_attribute(&instruction.name)
        ));
        let parameter_pad = indent(depth + 2);
        for parameter in &instruction.parameters {
            output.push_str(&format!(
                "{parameter_pad}<Parameter>{}</Parameter>\n",
                escape_text(parameter.plain_string())
            ));
        }
        output.push_str(&format!("{record_pad}</Instruction>\n"));
    }
    output.push_str(&format!("{pad}</{list_name}>\n"));
}

fn write_sub_events(output: &mut String, sub_events: &[EventNode], depth: usize) {
    if sub_events.is_empty() {
        return;
    }
    let pad = indent(depth);
    output.push_str(&format!("{pad}<Events>\n"));
    for event in sub_events {
        write_event(output, event, depth + 1);
    }
    output.push_str(&format!("{pad}</Events>\n"));
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
