//! Literal replacement rules and the invoice rule table.
//!
//! A rule is an exact search literal and its replacement. Rules run in
//! order, each one on the output of the previous, and every occurrence of
//! a search literal is replaced. There is no regex and no XML awareness:
//! the literals are fragments of `content.xml` markup, copied verbatim from
//! the filled-in invoice.

/// One literal search-and-replace-all step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplacementRule {
    /// Semantic group, e.g. "issue date"
    pub group: &'static str,
    /// Short name used in reports and warnings
    pub label: &'static str,
    pub search: &'static str,
    pub replace: &'static str,
}

impl ReplacementRule {
    pub const fn new(
        group: &'static str,
        label: &'static str,
        search: &'static str,
        replace: &'static str,
    ) -> Self {
        Self {
            group,
            label,
            search,
            replace,
        }
    }

    /// Replace every occurrence, returning the new text and the match count.
    ///
    /// An empty search literal matches nothing.
    pub fn apply(&self, text: &str) -> (String, usize) {
        if self.search.is_empty() {
            return (text.to_string(), 0);
        }
        let matches = text.matches(self.search).count();
        if matches == 0 {
            return (text.to_string(), 0);
        }
        (text.replace(self.search, self.replace), matches)
    }
}

/// How one rule fared against a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub group: &'static str,
    pub label: &'static str,
    pub matches: usize,
}

impl RuleOutcome {
    pub fn is_missed(&self) -> bool {
        self.matches == 0
    }
}

/// Result of running a [`RuleSet`] over a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub text: String,
    /// One outcome per rule, in rule order
    pub outcomes: Vec<RuleOutcome>,
}

impl Applied {
    pub fn missed(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| o.is_missed())
    }
}

/// Ordered list of replacement rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<ReplacementRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<ReplacementRule>) -> Self {
        Self { rules }
    }

    /// Rules for the shipped invoice template
    pub fn invoice() -> Self {
        Self::new(INVOICE_RULES.to_vec())
    }

    pub fn rules(&self) -> &[ReplacementRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule in order, each to the result of the previous one
    pub fn apply(&self, text: &str) -> Applied {
        let mut text = text.to_string();
        let mut outcomes = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let (next, matches) = rule.apply(&text);
            text = next;
            outcomes.push(RuleOutcome {
                group: rule.group,
                label: rule.label,
                matches,
            });
        }

        Applied { text, outcomes }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::invoice()
    }
}

const CUSTOMER_BLOCK: &str = concat!(
    r#"<text:h text:style-name="Heading3" text:outline-level="3"><text:line-break/>ScioŠkola Praha Nusle - základní škola, s.r.o.</text:h>"#,
    r#"<text:p text:style-name="P72">Boleslavova 250/1, Nusle, 140 00 Praha 4</text:p>"#,
    r#"<text:p text:style-name="P73">Česká republika</text:p>"#,
    r#"<text:h text:style-name="Heading3" text:outline-level="3">IČ: 07231881</text:h>"#,
);

/// Replacement table for the invoice template, in application order
pub const INVOICE_RULES: [ReplacementRule; 11] = [
    ReplacementRule::new(
        "title",
        "invoice number",
        concat!(
            r#"<text:span text:style-name="T2">FAKTURA - DAŇOVÝ DOKLAD č. 300</text:span>"#,
            r#"<text:span text:style-name="T3">6</text:span>"#,
            r#"<text:span text:style-name="T4">2025</text:span>"#,
        ),
        r#"<text:span text:style-name="T2">FAKTURA - DAŇOVÝ DOKLAD č. {{INVOICE_NO}}</text:span>"#,
    ),
    ReplacementRule::new(
        "issue date",
        "issue day",
        concat!(
            r#"<text:span text:style-name="T16">3</text:span>"#,
            r#"<text:span text:style-name="T17">0</text:span>"#,
            r#"<text:span text:style-name="T18">.</text:span>"#,
        ),
        r#"<text:span text:style-name="T16">{{ISSUE_DAY}}.</text:span>"#,
    ),
    ReplacementRule::new(
        "issue date",
        "issue month and year",
        concat!(
            r#"<text:span text:style-name="T21">6</text:span>"#,
            r#"<text:span text:style-name="T22">. 2025</text:span>"#,
        ),
        r#"<text:span text:style-name="T21">{{ISSUE_MONTH_YEAR}}</text:span>"#,
    ),
    // The day is preceded by a span holding two spaces, dropped with it
    ReplacementRule::new(
        "DUZP date",
        "DUZP day",
        concat!(
            r#"<text:span text:style-name="T29"><text:s text:c="2"/></text:span>"#,
            r#"<text:span text:style-name="T30">30</text:span>"#,
            r#"<text:span text:style-name="T31">.</text:span>"#,
        ),
        r#"<text:span text:style-name="T30">{{DUZP_DAY}}.</text:span>"#,
    ),
    ReplacementRule::new(
        "DUZP date",
        "DUZP month and year",
        concat!(
            r#"<text:span text:style-name="T34">6</text:span>"#,
            r#"<text:span text:style-name="T35">. 2025</text:span>"#,
        ),
        r#"<text:span text:style-name="T34">{{DUZP_MONTH_YEAR}}</text:span>"#,
    ),
    ReplacementRule::new(
        "due date",
        "due day",
        concat!(
            r#"<text:span text:style-name="T42">30</text:span>"#,
            r#"<text:span text:style-name="T43">.</text:span>"#,
        ),
        r#"<text:span text:style-name="T42">{{DUE_DAY}}.</text:span>"#,
    ),
    ReplacementRule::new(
        "due date",
        "due month and year",
        concat!(
            r#"<text:span text:style-name="T46">9</text:span>"#,
            r#"<text:span text:style-name="T47">. 2025</text:span>"#,
        ),
        r#"<text:span text:style-name="T46">{{DUE_MONTH_YEAR}}</text:span>"#,
    ),
    ReplacementRule::new("variable symbol", "variable symbol", "30062025", "{{VS}}"),
    ReplacementRule::new(
        "customer",
        "customer block",
        CUSTOMER_BLOCK,
        "{{CUSTOMER_BLOCK}}",
    ),
    ReplacementRule::new(
        "description",
        "description",
        concat!(
            r#"<text:span text:style-name="T108">Konzultační a programátorské služby na<text:s/></text:span>"#,
            r#"<text:span text:style-name="T109">EduMap</text:span>"#,
            r#"<text:span text:style-name="T110">.</text:span>"#,
        ),
        r#"<text:span text:style-name="T108">{{DESCRIPTION}}</text:span>"#,
    ),
    // Appears in the line item and in the totals
    ReplacementRule::new("amount", "amount", "90<text:s/>000,00 Kč", "{{AMOUNT}}"),
];

#[cfg(test)]
mod tests {
    use super::*;

    const AMOUNT: &str = "90<text:s/>000,00 Kč";

    fn rule(search: &'static str, replace: &'static str) -> ReplacementRule {
        ReplacementRule::new("test", search, search, replace)
    }

    #[test]
    fn replaces_every_occurrence() {
        let text = format!("<p>{AMOUNT}</p><p>total {AMOUNT}</p>");
        let applied = RuleSet::invoice().apply(&text);

        assert_eq!(applied.text, "<p>{{AMOUNT}}</p><p>total {{AMOUNT}}</p>");
        assert!(!applied.text.contains("000,00 Kč"));
        let amount = applied.outcomes.iter().find(|o| o.label == "amount").unwrap();
        assert_eq!(amount.matches, 2);
    }

    #[test]
    fn missing_literal_leaves_text_alone() {
        let applied = RuleSet::new(vec![rule("absent", "{{X}}")]).apply("<p>present</p>");
        assert_eq!(applied.text, "<p>present</p>");
        assert_eq!(applied.missed().count(), 1);
    }

    #[test]
    fn empty_search_matches_nothing() {
        let (text, matches) = rule("", "{{X}}").apply("abc");
        assert_eq!(text, "abc");
        assert_eq!(matches, 0);
    }

    #[test]
    fn rules_chain_on_previous_output() {
        let rules = RuleSet::new(vec![rule("a", "b"), rule("b", "c")]);
        let applied = rules.apply("ab");
        assert_eq!(applied.text, "cc");
        assert_eq!(applied.outcomes[0].matches, 1);
        assert_eq!(applied.outcomes[1].matches, 2);
    }

    #[test]
    fn application_is_deterministic() {
        let text = format!("{CUSTOMER_BLOCK}30062025{AMOUNT}");
        let rules = RuleSet::invoice();
        assert_eq!(rules.apply(&text), rules.apply(&text));
    }

    #[test]
    fn customer_block_collapses_to_one_token() {
        let text = format!("<office:text>{CUSTOMER_BLOCK}</office:text>");
        let applied = RuleSet::invoice().apply(&text);

        assert_eq!(applied.text, "<office:text>{{CUSTOMER_BLOCK}}</office:text>");
        assert_eq!(applied.text.matches("{{CUSTOMER_BLOCK}}").count(), 1);
        assert!(!applied.text.contains("Boleslavova"));
    }

    #[test]
    fn duzp_day_drops_leading_space_span() {
        let search = INVOICE_RULES[3].search;
        let applied = RuleSet::invoice().apply(search);
        assert_eq!(
            applied.text,
            r#"<text:span text:style-name="T30">{{DUZP_DAY}}.</text:span>"#
        );
    }

    #[test]
    fn every_invoice_rule_hits_its_own_literal() {
        let text: String = INVOICE_RULES.iter().map(|r| r.search).collect::<Vec<_>>().join("\n");
        let applied = RuleSet::invoice().apply(&text);

        assert_eq!(applied.missed().count(), 0, "{:?}", applied.outcomes);
        for token in [
            "{{INVOICE_NO}}",
            "{{ISSUE_DAY}}",
            "{{ISSUE_MONTH_YEAR}}",
            "{{DUZP_DAY}}",
            "{{DUZP_MONTH_YEAR}}",
            "{{DUE_DAY}}",
            "{{DUE_MONTH_YEAR}}",
            "{{VS}}",
            "{{CUSTOMER_BLOCK}}",
            "{{DESCRIPTION}}",
            "{{AMOUNT}}",
        ] {
            assert!(applied.text.contains(token), "missing {token}");
        }
    }

    #[test]
    fn sanitized_text_matches_nothing_again() {
        let text: String = INVOICE_RULES.iter().map(|r| r.search).collect();
        let rules = RuleSet::invoice();
        let once = rules.apply(&text);
        let twice = rules.apply(&once.text);

        assert_eq!(twice.text, once.text);
        assert_eq!(twice.missed().count(), INVOICE_RULES.len());
    }
}
