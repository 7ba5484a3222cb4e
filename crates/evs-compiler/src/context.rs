use std::collections::BTreeSet;

use regex::Regex;

/// Compile-time scope record: which objects are already picked and
/// visible at this nesting level. A value, not a shared object —
/// deriving a child or reset scope never mutates the enclosing one,
/// so sibling sub-trees can be generated in isolation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationContext {
    inherited: BTreeSet<String>,
    declared: BTreeSet<String>,
}

impl GenerationContext {
    pub fn root() -> Self {
        Self::default()
    }

    /// Child scope: everything visible in the parent stays visible,
    /// nothing is declared locally yet. Declarations made here are
    /// invisible to the parent.
    pub fn inherit_from(parent: &GenerationContext) -> Self {
        let mut inherited = parent.inherited.clone();
        inherited.extend(parent.declared.iter().cloned());
        Self {
            inherited,
            declared: BTreeSet::new(),
        }
    }

    /// Same inheritance link, empty local declarations. Loop bodies
    /// use this per iteration: outer picks stay visible while the
    /// scope's own object selections are re-derived.
    pub fn reset(&self) -> Self {
        Self {
            inherited: self.inherited.clone(),
            declared: BTreeSet::new(),
        }
    }

    /// Records an object pick in this scope. Returns false (and
    /// declares nothing) when the object is already visible here or
    /// further out.
    pub fn declare_object(&mut self, name: &str) -> bool {
        if self.is_visible(name) {
            return false;
        }
        self.declared.insert(name.to_string())
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.declared.contains(name) || self.inherited.contains(name)
    }

    pub fn declared_objects(&self) -> impl Iterator<Item = &str> {
        self.declared.iter().map(String::as_str)
    }

    /// Statements materializing this scope's locally-declared object
    /// selections. Must be emitted before any condition code that
    /// depends on them; inside a loop body they re-run every pass.
    pub fn objects_declaration_code(&self) -> String {
        let mut code = String::new();
        for name in &self.declared {
            code.push_str(&format!(
                "let {} = pick_objects(\"{}\");\n",
                object_variable_name(name),
                escape_string_literal(name)
            ));
        }
        code
    }
}

/// Target-code variable holding the picked selection for an object.
pub fn object_variable_name(object_name: &str) -> String {
    let sanitizer = Regex::new(r"[^A-Za-z0-9_]").expect("identifier regex must compile");
    let mut identifier = sanitizer.replace_all(object_name.trim(), "_").to_string();
    if identifier
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_digit())
    {
        identifier.insert(0, '_');
    }
    format!("{identifier}_objects")
}

fn escape_string_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
