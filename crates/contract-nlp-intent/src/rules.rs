//! Ordered rule tables.
//!
//! Every decision in the classifier (query type, base action, creation
//! intent) is a table of named predicates with an outcome and a priority.
//! Tables are evaluated highest priority first; the first rule whose
//! predicate holds decides.

/// One named predicate and the outcome it selects.
pub struct Rule<I, O> {
    pub name: &'static str,
    pub priority: u32,
    pub predicate: fn(&I) -> bool,
    pub outcome: O,
}

impl<I, O> Rule<I, O> {
    pub const fn new(name: &'static str, priority: u32, predicate: fn(&I) -> bool, outcome: O) -> Self {
        Self {
            name,
            priority,
            predicate,
            outcome,
        }
    }
}

/// Rules sorted by descending priority. Ties keep declaration order.
pub struct RuleTable<I, O> {
    rules: Vec<Rule<I, O>>,
}

impl<I, O: Copy> RuleTable<I, O> {
    pub fn new(mut rules: Vec<Rule<I, O>>) -> Self {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { rules }
    }

    /// Outcome of the first matching rule, with the rule's name.
    pub fn evaluate(&self, input: &I) -> Option<(&'static str, O)> {
        self.rules
            .iter()
            .find(|r| (r.predicate)(input))
            .map(|r| (r.name, r.outcome))
    }

    /// Rule names in evaluation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
