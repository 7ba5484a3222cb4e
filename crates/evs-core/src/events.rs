use serde::{Deserialize, Serialize};

/// Opaque formula text. Evaluated into target code at generation
/// time; never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expression(String);

impl Expression {
    pub fn new(formula: impl Into<String>) -> Self {
        Self(formula.into())
    }

    pub fn plain_string(&self) -> &str {
        &self.0
    }
}

/// A named condition or action call with ordered expression
/// parameters. Arity is enforced by the instruction catalog, not
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub name: String,
    pub parameters: Vec<Expression>,
    pub negated: bool,
}

impl Instruction {
    pub fn new(name: impl Into<String>, parameters: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            parameters,
            negated: false,
        }
    }

    pub fn negated(name: impl Into<String>, parameters: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            parameters,
            negated: true,
        }
    }
}

/// One node of the authored behavior tree. Every variant owns its
/// instruction lists and its sub-event subtree outright, so the
/// derived `Clone` is the deep copy the editor relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EventNode {
    Standard {
        conditions: Vec<Instruction>,
        actions: Vec<Instruction>,
        sub_events: Vec<EventNode>,
    },
    Repeat {
        repeat_expression: Expression,
        conditions: Vec<Instruction>,
        actions: Vec<Instruction>,
        sub_events: Vec<EventNode>,
    },
    While {
        while_conditions: Vec<Instruction>,
        conditions: Vec<Instruction>,
        actions: Vec<Instruction>,
        sub_events: Vec<EventNode>,
    },
    Comment {
        text: String,
    },
}

const NO_SUB_EVENTS: &[EventNode] = &[];

impl EventNode {
    pub fn kind_name(&self) -> &'static str {
        match self {
            EventNode::Standard { .. } => "Standard",
            EventNode::Repeat { .. } => "Repeat",
            EventNode::While { .. } => "While",
            EventNode::Comment { .. } => "Comment",
        }
    }

    /// Whether the node contributes behavior at runtime. Comments
    /// are organizational markers only.
    pub fn is_executable(&self) -> bool {
        !matches!(self, EventNode::Comment { .. })
    }

    pub fn can_have_sub_events(&self) -> bool {
        !matches!(self, EventNode::Comment { .. })
    }

    /// Stable empty slice for variants without sub-events, so
    /// callers can iterate heterogeneous nodes uniformly.
    pub fn sub_events(&self) -> &[EventNode] {
        match self {
            EventNode::Standard { sub_events, .. }
            | EventNode::Repeat { sub_events, .. }
            | EventNode::While { sub_events, .. } => sub_events,
            EventNode::Comment { .. } => NO_SUB_EVENTS,
        }
    }

    pub fn sub_events_mut(&mut self) -> Option<&mut Vec<EventNode>> {
        match self {
            EventNode::Standard { sub_events, .. }
            | EventNode::Repeat { sub_events, .. }
            | EventNode::While { sub_events, .. } => Some(sub_events),
            EventNode::Comment { .. } => None,
        }
    }

    /// Every condition list the node owns, in evaluation order. A
    /// While node owns two: the loop guard first, then the inner
    /// conditions. Cross-cutting tooling (search, rename,
    /// validation) iterates these without special-casing variants.
    pub fn all_conditions_lists(&self) -> Vec<&Vec<Instruction>> {
        match self {
            EventNode::Standard { conditions, .. } | EventNode::Repeat { conditions, .. } => {
                vec![conditions]
            }
            EventNode::While {
                while_conditions,
                conditions,
                ..
            } => vec![while_conditions, conditions],
            EventNode::Comment { .. } => Vec::new(),
        }
    }

    pub fn all_conditions_lists_mut(&mut self) -> Vec<&mut Vec<Instruction>> {
        match self {
            EventNode::Standard { conditions, .. } | EventNode::Repeat { conditions, .. } => {
                vec![conditions]
            }
            EventNode::While {
                while_conditions,
                conditions,
                ..
            } => vec![while_conditions, conditions],
            EventNode::Comment { .. } => Vec::new(),
        }
    }

    pub fn all_actions_lists(&self) -> Vec<&Vec<Instruction>> {
        match self {
            EventNode::Standard { actions, .. }
            | EventNode::Repeat { actions, .. }
            | EventNode::While { actions, .. } => vec![actions],
            EventNode::Comment { .. } => Vec::new(),
        }
    }

    pub fn all_actions_lists_mut(&mut self) -> Vec<&mut Vec<Instruction>> {
        match self {
            EventNode::Standard { actions, .. }
            | EventNode::Repeat { actions, .. }
            | EventNode::While { actions, .. } => vec![actions],
            EventNode::Comment { .. } => Vec::new(),
        }
    }

    /// Every expression reachable from this node's own instructions,
    /// not recursing into sub-events. Repeat includes its count
    /// expression.
    pub fn all_expressions(&self) -> Vec<&Expression> {
        let mut expressions = Vec::new();
        if let EventNode::Repeat {
            repeat_expression, ..
        } = self
        {
            expressions.push(repeat_expression);
        }
        for list in self.all_conditions_lists() {
            for instruction in list {
                expressions.extend(instruction.parameters.iter());
            }
        }
        for list in self.all_actions_lists() {
            for instruction in list {
                expressions.extend(instruction.parameters.iter());
            }
        }
        expressions
    }

    pub fn all_expressions_mut(&mut self) -> Vec<&mut Expression> {
        let mut expressions: Vec<&mut Expression> = Vec::new();
        match self {
            EventNode::Standard {
                conditions,
                actions,
                ..
            } => {
                collect_parameters_mut(conditions, &mut expressions);
                collect_parameters_mut(actions, &mut expressions);
            }
            EventNode::Repeat {
                repeat_expression,
                conditions,
                actions,
                ..
            } => {
                expressions.push(repeat_expression);
                collect_parameters_mut(conditions, &mut expressions);
                collect_parameters_mut(actions, &mut expressions);
            }
            EventNode::While {
                while_conditions,
                conditions,
                actions,
                ..
            } => {
                collect_parameters_mut(while_conditions, &mut expressions);
                collect_parameters_mut(conditions, &mut expressions);
                collect_parameters_mut(actions, &mut expressions);
            }
            EventNode::Comment { .. } => {}
        }
        expressions
    }
}

fn collect_parameters_mut<'a>(
    instructions: &'a mut [Instruction],
    into: &mut Vec<&'a mut Expression>,
) {
    for instruction in instructions {
        into.extend(instruction.parameters.iter_mut());
    }
}
