use evs_core::{Diagnostic, EventNode, Expression, Instruction};
use rhai::Engine;

use crate::catalog::InstructionRegistry;
use crate::context::{object_variable_name, GenerationContext};
use crate::expressions::compile_expression;

/// Output of one generation call: the emitted target-code blob plus
/// every recoverable finding. Malformed input degrades to inert code
/// with a diagnostic; generation itself never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstructionKind {
    Condition,
    Action,
}

/// Walks an event tree top-down and emits target code, threading the
/// scope-inheritance protocol. Holds only the read-only catalog and
/// an expression-checking engine; repeated generation from the same
/// tree and an equivalent context yields identical output.
pub struct CodeGenerator<'r> {
    registry: &'r InstructionRegistry,
    engine: Engine,
}

impl<'r> CodeGenerator<'r> {
    pub fn new(registry: &'r InstructionRegistry) -> Self {
        Self {
            registry,
            engine: Engine::new(),
        }
    }

    pub fn generate_code(
        &self,
        events: &[EventNode],
        parent_context: &GenerationContext,
    ) -> GeneratedCode {
        let mut diagnostics = Vec::new();
        let code = self.generate_events_list_code(events, parent_context, &mut diagnostics);
        GeneratedCode { code, diagnostics }
    }

    fn generate_events_list_code(
        &self,
        events: &[EventNode],
        parent_context: &GenerationContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        let mut output = String::new();
        for event in events {
            if !event.is_executable() {
                continue;
            }

            let event_code = match event {
                EventNode::Standard {
                    conditions,
                    actions,
                    sub_events,
                } => self.generate_standard_event_code(
                    conditions,
                    actions,
                    sub_events,
                    parent_context,
                    diagnostics,
                ),
                EventNode::Repeat {
                    repeat_expression,
                    conditions,
                    actions,
                    sub_events,
                } => self.generate_repeat_event_code(
                    repeat_expression,
                    conditions,
                    actions,
                    sub_events,
                    parent_context,
                    diagnostics,
                ),
                EventNode::While {
                    while_conditions,
                    conditions,
                    actions,
                    sub_events,
                } => self.generate_while_event_code(
                    while_conditions,
                    conditions,
                    actions,
                    sub_events,
                    parent_context,
                    diagnostics,
                ),
                EventNode::Comment { .. } => String::new(),
            };

            output.push_str("{\n");
            output.push_str(&event_code);
            output.push_str("}\n");
        }
        output
    }

    /// Per instruction a positional truth flag, then the combined
    /// predicate: the AND of all flags, vacuously `true` for an
    /// empty list. Zero conditions always pass.
    pub fn generate_conditions_code(
        &self,
        conditions: &[Instruction],
        context: &mut GenerationContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (String, String) {
        let mut code = String::new();
        for (index, instruction) in conditions.iter().enumerate() {
            let flag = match self.generate_instruction_call(
                instruction,
                InstructionKind::Condition,
                context,
                diagnostics,
            ) {
                Some(value) if instruction.negated => format!("!({value})"),
                Some(value) => value,
                // Degraded condition: inert, passes through the AND.
                None => "true".to_string(),
            };
            code.push_str(&format!("let condition{index}IsTrue = {flag};\n"));
        }

        let mut predicate = String::from("true");
        for index in 0..conditions.len() {
            predicate.push_str(&format!(" && condition{index}IsTrue"));
        }
        (code, predicate)
    }

    /// Flat statement sequence, no implicit guarding. Guarding with
    /// the conditions predicate is the caller's responsibility.
    pub fn generate_actions_code(
        &self,
        actions: &[Instruction],
        context: &mut GenerationContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        let mut code = String::new();
        for instruction in actions {
            if let Some(call) = self.generate_instruction_call(
                instruction,
                InstructionKind::Action,
                context,
                diagnostics,
            ) {
                code.push_str(&call);
                code.push_str(";\n");
            }
        }
        code
    }

    fn generate_instruction_call(
        &self,
        instruction: &Instruction,
        kind: InstructionKind,
        context: &mut GenerationContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<String> {
        let (descriptor, kind_label) = match kind {
            InstructionKind::Condition => (self.registry.condition(&instruction.name), "condition"),
            InstructionKind::Action => (self.registry.action(&instruction.name), "action"),
        };

        let Some(descriptor) = descriptor else {
            diagnostics.push(Diagnostic::error(
                "INSTRUCTION_UNKNOWN",
                format!(
                    "Unknown {} \"{}\"; generating it as a no-op.",
                    kind_label, instruction.name
                ),
            ));
            return None;
        };

        if instruction.parameters.len() != descriptor.arity {
            diagnostics.push(Diagnostic::error(
                "INSTRUCTION_ARITY_MISMATCH",
                format!(
                    "{} \"{}\" takes {} parameter(s) but got {}; generating it as a no-op.",
                    kind_label, instruction.name, descriptor.arity, instruction.parameters.len()
                ),
            ));
            return None;
        }

        let mut parameter_code = Vec::with_capacity(instruction.parameters.len());
        for (index, parameter) in instruction.parameters.iter().enumerate() {
            if descriptor.is_object_parameter(index) {
                let object_name = parameter.plain_string().trim();
                if object_name.is_empty() {
                    diagnostics.push(Diagnostic::error(
                        "INSTRUCTION_OBJECT_NAME_EMPTY",
                        format!(
                            "{} \"{}\" names no object in parameter {}; generating it as a no-op.",
                            kind_label, instruction.name, index
                        ),
                    ));
                    return None;
                }
                context.declare_object(object_name);
                parameter_code.push(object_variable_name(object_name));
            } else {
                match compile_expression(&self.engine, parameter, context) {
                    Ok(fragment) => parameter_code.push(fragment),
                    Err(error) => {
                        diagnostics.push(Diagnostic::error(
                            error.code,
                            format!(
                                "{} \"{}\", parameter {}: {}",
                                kind_label, instruction.name, index, error.message
                            ),
                        ));
                        return None;
                    }
                }
            }
        }

        Some(descriptor.expand_template(&parameter_code))
    }

    /// Declarations, conditions, then the guarded block: actions
    /// followed by sub-events, which run only when this node's own
    /// conditions held.
    fn generate_standard_event_code(
        &self,
        conditions: &[Instruction],
        actions: &[Instruction],
        sub_events: &[EventNode],
        parent_context: &GenerationContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        let mut context = GenerationContext::inherit_from(parent_context);

        let (conditions_code, predicate) =
            self.generate_conditions_code(conditions, &mut context, diagnostics);
        let actions_code = self.generate_actions_code(actions, &mut context, diagnostics);
        let sub_events_code = self.generate_events_list_code(sub_events, &context, diagnostics);

        let mut output = String::new();
        output.push_str(&context.objects_declaration_code());
        output.push_str(&conditions_code);
        output.push_str(&format!("if {predicate} {{\n"));
        output.push_str(&actions_code);
        if !sub_events_code.is_empty() {
            output.push_str("{\n");
            output.push_str(&sub_events_code);
            output.push_str("}\n");
        }
        output.push_str("}\n");
        output
    }

    /// Count is evaluated once, before the loop. Declarations sit
    /// inside the body from a scope reset per iteration, so object
    /// picks re-run every pass. A float count truncates toward zero;
    /// a non-numeric or negative count is coerced to zero iterations.
    fn generate_repeat_event_code(
        &self,
        repeat_expression: &Expression,
        conditions: &[Instruction],
        actions: &[Instruction],
        sub_events: &[EventNode],
        parent_context: &GenerationContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        let count_code =
            match compile_expression(&self.engine, repeat_expression, parent_context) {
                Ok(fragment) => fragment,
                Err(error) => {
                    diagnostics.push(Diagnostic::error(
                        error.code,
                        format!("Repeat count: {} Running zero iterations.", error.message),
                    ));
                    "(0)".to_string()
                }
            };

        let mut context = GenerationContext::inherit_from(parent_context).reset();

        let (conditions_code, predicate) =
            self.generate_conditions_code(conditions, &mut context, diagnostics);
        let actions_code = self.generate_actions_code(actions, &mut context, diagnostics);
        let sub_events_code = self.generate_events_list_code(sub_events, &context, diagnostics);

        let mut output = String::new();
        output.push_str(&format!("let repeat_count = {count_code};\n"));
        output.push_str(
            "if type_of(repeat_count) == \"f64\" { repeat_count = repeat_count.to_int(); }\n",
        );
        output.push_str("if type_of(repeat_count) != \"i64\" { repeat_count = 0; }\n");
        output.push_str("if repeat_count < 0 { repeat_count = 0; }\n");
        output.push_str("for repeat_index in 0..repeat_count {\n");
        output.push_str(&context.objects_declaration_code());
        output.push_str(&conditions_code);
        output.push_str(&format!("if {predicate} {{\n"));
        output.push_str(&actions_code);
        if !sub_events_code.is_empty() {
            output.push_str("{\n");
            output.push_str(&sub_events_code);
            output.push_str("}\n");
        }
        output.push_str("}\n");
        output.push_str("}\n");
        output
    }

    /// Guard/body state machine as a do-while: a false guard stops
    /// the loop; a true guard with false inner conditions is a
    /// one-pass no-op that still returns to the guard. The guard and
    /// the inner list share one scope reset per pass, so inner
    /// conditions see objects the guard picked. No iteration cap:
    /// an always-true guard loops forever at runtime.
    fn generate_while_event_code(
        &self,
        while_conditions: &[Instruction],
        conditions: &[Instruction],
        actions: &[Instruction],
        sub_events: &[EventNode],
        parent_context: &GenerationContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        if while_conditions.is_empty() {
            diagnostics.push(Diagnostic::warning(
                "WHILE_GUARD_ALWAYS_TRUE",
                "While event has no guard conditions; its guard is always true and \
                 the emitted loop can only stop through a runtime interrupt.",
            ));
        }

        let mut context = GenerationContext::inherit_from(parent_context).reset();

        let (guard_code, guard_predicate) =
            self.generate_conditions_code(while_conditions, &mut context, diagnostics);
        let (conditions_code, predicate) =
            self.generate_conditions_code(conditions, &mut context, diagnostics);
        let actions_code = self.generate_actions_code(actions, &mut context, diagnostics);
        let sub_events_code = self.generate_events_list_code(sub_events, &context, diagnostics);

        let mut output = String::new();
        output.push_str("let stop_do_while = false;\n");
        output.push_str("do {\n");
        output.push_str(&context.objects_declaration_code());
        output.push_str(&guard_code);
        output.push_str(&format!("if {guard_predicate} {{\n"));
        output.push_str(&conditions_code);
        output.push_str(&format!("if {predicate} {{\n"));
        output.push_str(&actions_code);
        if !sub_events_code.is_empty() {
            output.push_str("{\n");
            output.push_str(&sub_events_code);
            output.push_str("}\n");
        }
        output.push_str("}\n");
        output.push_str("} else {\n");
        output.push_str("stop_do_while = true;\n");
        output.push_str("}\n");
        output.push_str("} while !stop_do_while;\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use evs_core::Severity;

    use super::*;
    use crate::catalog::InstructionDescriptor;

    fn registry() -> InstructionRegistry {
        let mut registry = InstructionRegistry::new();
        registry.register_condition("Probe", InstructionDescriptor::new(0, "probe()"));
        registry.register_condition(
            "CounterBelow",
            InstructionDescriptor::new(1, "counter_below(_PARAM0_)"),
        );
        registry.register_condition(
            "ObjectVisible",
            InstructionDescriptor::new(1, "is_visible(_PARAM0_)").with_object_parameters(&[0]),
        );
        registry.register_action("Track", InstructionDescriptor::new(0, "track()"));
        registry.register_action(
            "AddScore",
            InstructionDescriptor::new(1, "add_score(_PARAM0_)"),
        );
        registry
    }

    fn instruction(name: &str, parameters: &[&str]) -> Instruction {
        Instruction::new(
            name,
            parameters.iter().map(|p| Expression::new(*p)).collect(),
        )
    }

    fn standard(conditions: Vec<Instruction>, actions: Vec<Instruction>) -> EventNode {
        EventNode::Standard {
            conditions,
            actions,
            sub_events: Vec::new(),
        }
    }

    /// Engine wired with the host functions the test catalog emits
    /// calls to, plus shared counters the assertions read back.
    struct Harness {
        engine: Engine,
        track_calls: Rc<RefCell<i64>>,
        probe_calls: Rc<RefCell<i64>>,
        pick_calls: Rc<RefCell<i64>>,
        score: Rc<RefCell<i64>>,
    }

    impl Harness {
        fn new(probe_flags: Vec<bool>) -> Self {
            let track_calls = Rc::new(RefCell::new(0_i64));
            let probe_calls = Rc::new(RefCell::new(0_i64));
            let pick_calls = Rc::new(RefCell::new(0_i64));
            let score = Rc::new(RefCell::new(0_i64));
            let flags = Rc::new(RefCell::new(probe_flags));

            let mut engine = Engine::new();
            {
                let track_calls = Rc::clone(&track_calls);
                engine.register_fn("track", move || {
                    *track_calls.borrow_mut() += 1;
                });
            }
            {
                let probe_calls = Rc::clone(&probe_calls);
                engine.register_fn("probe", move || {
                    let call_index = *probe_calls.borrow() as usize;
                    *probe_calls.borrow_mut() += 1;
                    flags.borrow().get(call_index).copied().unwrap_or(false)
                });
            }
            {
                let pick_calls = Rc::clone(&pick_calls);
                engine.register_fn("pick_objects", move |name: &str| {
                    *pick_calls.borrow_mut() += 1;
                    name.len() as i64
                });
            }
            {
                let score = Rc::clone(&score);
                engine.register_fn("add_score", move |amount: i64| {
                    *score.borrow_mut() += amount;
                });
            }
            {
                let score = Rc::clone(&score);
                engine.register_fn("counter_below", move |limit: i64| *score.borrow() < limit);
            }
            engine.register_fn("is_visible", |objects: i64| objects > 0);

            Self {
                engine,
                track_calls,
                probe_calls,
                pick_calls,
                score,
            }
        }

        fn run(&self, generated: &GeneratedCode) {
            self.engine
                .run(&generated.code)
                .expect("generated code should run");
        }
    }

    fn generate(events: &[EventNode]) -> GeneratedCode {
        let registry = registry();
        let generator = CodeGenerator::new(&registry);
        generator.generate_code(events, &GenerationContext::root())
    }

    #[test]
    fn empty_conditions_list_yields_vacuously_true_predicate() {
        let registry = registry();
        let generator = CodeGenerator::new(&registry);
        let mut context = GenerationContext::root();
        let mut diagnostics = Vec::new();

        let (code, predicate) =
            generator.generate_conditions_code(&[], &mut context, &mut diagnostics);
        assert!(code.is_empty());
        assert_eq!(predicate, "true");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn conditions_produce_positional_flags_and_anded_predicate() {
        let registry = registry();
        let generator = CodeGenerator::new(&registry);
        let mut context = GenerationContext::root();
        let mut diagnostics = Vec::new();

        let list = vec![
            instruction("Probe", &[]),
            Instruction::negated("CounterBelow", vec![Expression::new("10")]),
        ];
        let (code, predicate) =
            generator.generate_conditions_code(&list, &mut context, &mut diagnostics);

        assert!(code.contains("let condition0IsTrue = probe();"));
        assert!(code.contains("let condition1IsTrue = !(counter_below((10)));"));
        assert_eq!(predicate, "true && condition0IsTrue && condition1IsTrue");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn standard_event_with_no_conditions_always_runs_actions() {
        let generated = generate(&[standard(Vec::new(), vec![instruction("Track", &[])])]);
        assert!(generated.diagnostics.is_empty());

        let harness = Harness::new(Vec::new());
        harness.run(&generated);
        assert_eq!(*harness.track_calls.borrow(), 1);
    }

    #[test]
    fn standard_event_with_false_condition_skips_actions_and_sub_events() {
        let generated = generate(&[EventNode::Standard {
            conditions: vec![instruction("Probe", &[])],
            actions: vec![instruction("Track", &[])],
            sub_events: vec![standard(Vec::new(), vec![instruction("Track", &[])])],
        }]);

        let harness = Harness::new(vec![false]);
        harness.run(&generated);
        assert_eq!(*harness.probe_calls.borrow(), 1);
        assert_eq!(*harness.track_calls.borrow(), 0);
    }

    #[test]
    fn sub_events_run_after_actions_when_conditions_hold() {
        let generated = generate(&[EventNode::Standard {
            conditions: vec![instruction("Probe", &[])],
            actions: vec![instruction("AddScore", &["2"])],
            sub_events: vec![standard(Vec::new(), vec![instruction("Track", &[])])],
        }]);

        let harness = Harness::new(vec![true]);
        harness.run(&generated);
        assert_eq!(*harness.score.borrow(), 2);
        assert_eq!(*harness.track_calls.borrow(), 1);
    }

    #[test]
    fn comment_events_emit_no_code() {
        let generated = generate(&[EventNode::Comment {
            text: "organizational note".to_string(),
        }]);
        assert!(generated.code.is_empty());
        assert!(generated.diagnostics.is_empty());
    }

    #[test]
    fn repeat_event_runs_actions_count_times() {
        let generated = generate(&[EventNode::Repeat {
            repeat_expression: Expression::new("3"),
            conditions: Vec::new(),
            actions: vec![instruction("Track", &[])],
            sub_events: Vec::new(),
        }]);
        assert!(generated.diagnostics.is_empty());

        let harness = Harness::new(Vec::new());
        harness.run(&generated);
        assert_eq!(*harness.track_calls.borrow(), 3);
    }

    #[test]
    fn repeat_event_with_non_positive_count_never_runs_body() {
        for count in ["0", "2 - 5"] {
            let generated = generate(&[EventNode::Repeat {
                repeat_expression: Expression::new(count),
                conditions: Vec::new(),
                actions: vec![instruction("Track", &[])],
                sub_events: Vec::new(),
            }]);

            let harness = Harness::new(Vec::new());
            harness.run(&generated);
            assert_eq!(*harness.track_calls.borrow(), 0, "count {count}");
        }
    }

    #[test]
    fn repeat_event_truncates_positive_float_counts() {
        // A numeric, positive count must loop even when the formula
        // evaluates to a float (e.g. via float division).
        for (count, expected) in [("6.0 / 2", 3), ("2.9", 2), ("-3.5", 0)] {
            let generated = generate(&[EventNode::Repeat {
                repeat_expression: Expression::new(count),
                conditions: Vec::new(),
                actions: vec![instruction("Track", &[])],
                sub_events: Vec::new(),
            }]);

            let harness = Harness::new(Vec::new());
            harness.run(&generated);
            assert_eq!(*harness.track_calls.borrow(), expected, "count {count}");
        }
    }

    #[test]
    fn repeat_event_with_non_numeric_count_never_runs_body() {
        let generated = generate(&[EventNode::Repeat {
            repeat_expression: Expression::new("\"three\""),
            conditions: Vec::new(),
            actions: vec![instruction("Track", &[])],
            sub_events: Vec::new(),
        }]);

        let harness = Harness::new(Vec::new());
        harness.run(&generated);
        assert_eq!(*harness.track_calls.borrow(), 0);
    }

    #[test]
    fn repeat_event_repicks_objects_every_iteration() {
        let generated = generate(&[EventNode::Repeat {
            repeat_expression: Expression::new("3"),
            conditions: vec![instruction("ObjectVisible", &["enemy"])],
            actions: vec![instruction("Track", &[])],
            sub_events: Vec::new(),
        }]);

        let declaration = "let enemy_objects = pick_objects(\"enemy\");";
        let declaration_offset = generated
            .code
            .find(declaration)
            .expect("declaration should be emitted");
        let loop_offset = generated
            .code
            .find("for repeat_index")
            .expect("loop should be emitted");
        assert!(declaration_offset > loop_offset, "pick must sit inside the loop");

        let harness = Harness::new(Vec::new());
        harness.run(&generated);
        assert_eq!(*harness.pick_calls.borrow(), 3);
        assert_eq!(*harness.track_calls.borrow(), 3);
    }

    #[test]
    fn while_event_with_false_guard_stops_before_body() {
        let generated = generate(&[EventNode::While {
            while_conditions: vec![instruction("Probe", &[])],
            conditions: vec![instruction("CounterBelow", &["100"])],
            actions: vec![instruction("Track", &[])],
            sub_events: vec![standard(Vec::new(), vec![instruction("Track", &[])])],
        }]);
        assert!(generated.diagnostics.is_empty());

        let harness = Harness::new(vec![false]);
        harness.run(&generated);
        assert_eq!(*harness.probe_calls.borrow(), 1);
        assert_eq!(*harness.track_calls.borrow(), 0);
    }

    #[test]
    fn while_event_loops_until_guard_fails() {
        let generated = generate(&[EventNode::While {
            while_conditions: vec![instruction("Probe", &[])],
            conditions: Vec::new(),
            actions: vec![instruction("Track", &[])],
            sub_events: Vec::new(),
        }]);

        let harness = Harness::new(vec![true, true, false]);
        harness.run(&generated);
        assert_eq!(*harness.probe_calls.borrow(), 3);
        assert_eq!(*harness.track_calls.borrow(), 2);
    }

    #[test]
    fn while_guard_true_with_false_inner_conditions_is_a_soft_stop() {
        // Pass 1: guard true, inner condition false -> no actions,
        // back to the guard. Pass 2: guard false -> stop. The inner
        // failure must not end the loop on its own.
        let generated = generate(&[EventNode::While {
            while_conditions: vec![instruction("Probe", &[])],
            conditions: vec![instruction("CounterBelow", &["0"])],
            actions: vec![instruction("Track", &[])],
            sub_events: Vec::new(),
        }]);

        let harness = Harness::new(vec![true, false]);
        harness.run(&generated);
        assert_eq!(*harness.probe_calls.borrow(), 2);
        assert_eq!(*harness.track_calls.borrow(), 0);
    }

    #[test]
    fn while_event_without_guard_conditions_warns_about_unbounded_loop() {
        let registry = registry();
        let generator = CodeGenerator::new(&registry);
        let mut diagnostics = Vec::new();

        // Assemble without running: the emitted loop would never end.
        let code = generator.generate_while_event_code(
            &[],
            &[instruction("Probe", &[])],
            &[instruction("Track", &[])],
            &[],
            &GenerationContext::root(),
            &mut diagnostics,
        );
        assert!(code.contains("if true {"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "WHILE_GUARD_ALWAYS_TRUE");
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn unknown_instruction_degrades_to_no_op_with_diagnostic() {
        let generated = generate(&[standard(
            vec![instruction("NoSuchCondition", &[])],
            vec![instruction("NoSuchAction", &[]), instruction("Track", &[])],
        )]);

        let codes: Vec<&str> = generated
            .diagnostics
            .iter()
            .map(|diagnostic| diagnostic.code.as_str())
            .collect();
        assert_eq!(codes, vec!["INSTRUCTION_UNKNOWN", "INSTRUCTION_UNKNOWN"]);

        // The degraded condition passes and the rest still runs.
        let harness = Harness::new(Vec::new());
        harness.run(&generated);
        assert_eq!(*harness.track_calls.borrow(), 1);
    }

    #[test]
    fn arity_mismatch_degrades_single_instruction_only() {
        let generated = generate(&[standard(
            vec![instruction("CounterBelow", &["1", "2"])],
            vec![instruction("Track", &[])],
        )]);

        assert_eq!(generated.diagnostics.len(), 1);
        assert_eq!(generated.diagnostics[0].code, "INSTRUCTION_ARITY_MISMATCH");

        let harness = Harness::new(Vec::new());
        harness.run(&generated);
        assert_eq!(*harness.track_calls.borrow(), 1);
    }

    #[test]
    fn malformed_expression_degrades_instruction_with_diagnostic() {
        let generated = generate(&[standard(
            Vec::new(),
            vec![
                instruction("AddScore", &["1 +"]),
                instruction("AddScore", &["5"]),
            ],
        )]);

        assert_eq!(generated.diagnostics.len(), 1);
        assert_eq!(generated.diagnostics[0].code, "EXPR_COMPILE_ERROR");

        let harness = Harness::new(Vec::new());
        harness.run(&generated);
        assert_eq!(*harness.score.borrow(), 5);
    }

    #[test]
    fn object_is_declared_once_per_scope_and_not_redeclared_in_sub_events() {
        let generated = generate(&[EventNode::Standard {
            conditions: vec![
                instruction("ObjectVisible", &["enemy"]),
                Instruction::negated("ObjectVisible", vec![Expression::new("enemy")]),
            ],
            actions: Vec::new(),
            sub_events: vec![standard(
                vec![instruction("ObjectVisible", &["enemy"])],
                vec![instruction("Track", &[])],
            )],
        }]);

        let declarations = generated
            .code
            .matches("let enemy_objects = pick_objects(\"enemy\");")
            .count();
        assert_eq!(declarations, 1);

        let harness = Harness::new(Vec::new());
        harness.run(&generated);
        assert_eq!(*harness.pick_calls.borrow(), 1);
    }

    #[test]
    fn generation_is_deterministic_for_equal_input() {
        let events = vec![EventNode::While {
            while_conditions: vec![instruction("CounterBelow", &["3"])],
            conditions: vec![instruction("ObjectVisible", &["enemy"])],
            actions: vec![instruction("AddScore", &["1"])],
            sub_events: vec![standard(Vec::new(), vec![instruction("Track", &[])])],
        }];

        let first = generate(&events);
        let second = generate(&events);
        assert_eq!(first, second);
    }
}
