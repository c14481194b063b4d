use crate::config::Config;
use crate::document::ParsedElement;
use crate::literal::literal;

/// Where a predicate's value was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateSource {
    /// Text of the configured filter child under a filter parent.
    ChildText,
    /// Value of the configured predicate attribute.
    Attribute,
}

/// At most one `[@name=literal]` filter for a step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    source: Option<PredicateSource>,
    rendered: String,
}

impl Predicate {
    pub fn none() -> Self {
        Self::default()
    }

    fn new(source: PredicateSource, name: &str, value: &str) -> Self {
        Self {
            source: Some(source),
            rendered: format!("[@{name}={}]", literal(value)),
        }
    }

    pub fn source(&self) -> Option<PredicateSource> {
        self.source
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

/// Derives the predicate for each element from the configured rules.
#[derive(Debug, Clone, Copy)]
pub struct PredicateBuilder<'c> {
    filter_parent: Option<&'c str>,
    filter_child: Option<&'c str>,
    attribute: Option<&'c str>,
}

impl<'c> PredicateBuilder<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            filter_parent: config.filter_parent(),
            filter_child: config.filter_child(),
            attribute: config.predicate_attribute(),
        }
    }

    /// First matching rule wins; rules are never combined.
    ///
    /// The child-text rule renders with `@` just like the attribute rule.
    /// Downstream consumers read it that way.
    pub fn predicate_for(&self, element: &ParsedElement) -> Predicate {
        if let (Some(parent), Some(child_name)) = (self.filter_parent, self.filter_child) {
            if element.name.bare() == parent {
                let text = element
                    .child(child_name)
                    .map(ParsedElement::trimmed_text)
                    .unwrap_or_default();
                if !text.is_empty() {
                    return Predicate::new(PredicateSource::ChildText, child_name, text);
                }
            }
        }

        if let Some(name) = self.attribute {
            let value = element.attribute(name).map(str::trim).unwrap_or_default();
            if !value.is_empty() {
                return Predicate::new(PredicateSource::Attribute, name, value);
            }
        }

        Predicate::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_image(xml: &str) -> ParsedElement {
        let root = ParsedElement::parse(xml).unwrap();
        root.child("IMAGE").cloned().unwrap()
    }

    #[test]
    fn child_text_rule_wins_over_attribute() {
        let image = first_image(
            r#"<P><IMAGE ValuationUseType="Exterior"><ImageCategoryType> Front </ImageCategoryType></IMAGE></P>"#,
        );
        let config = Config::default();
        let predicate = PredicateBuilder::new(&config).predicate_for(&image);
        assert_eq!(predicate.as_str(), "[@ImageCategoryType='Front']");
        assert_eq!(predicate.source(), Some(PredicateSource::ChildText));
    }

    #[test]
    fn blank_child_falls_through_to_attribute() {
        let image = first_image(
            r#"<P><IMAGE ValuationUseType="Exterior"><ImageCategoryType>  </ImageCategoryType></IMAGE></P>"#,
        );
        let config = Config::default();
        let predicate = PredicateBuilder::new(&config).predicate_for(&image);
        assert_eq!(predicate.as_str(), "[@ValuationUseType='Exterior']");
        assert_eq!(predicate.source(), Some(PredicateSource::Attribute));
    }

    #[test]
    fn child_rule_only_applies_to_filter_parent() {
        let root = ParsedElement::parse(
            r#"<P><SITE><ImageCategoryType>Front</ImageCategoryType></SITE></P>"#,
        )
        .unwrap();
        let site = root.child("SITE").unwrap();
        let config = Config::default();
        assert!(PredicateBuilder::new(&config).predicate_for(site).is_empty());
    }

    #[test]
    fn disabled_rules_yield_no_predicate() {
        let image = first_image(
            r#"<P><IMAGE ValuationUseType="Exterior"><ImageCategoryType>Front</ImageCategoryType></IMAGE></P>"#,
        );
        let config = Config::default()
            .with_predicate_attribute(None)
            .with_filter_pair(None, None);
        let predicate = PredicateBuilder::new(&config).predicate_for(&image);
        assert_eq!(predicate, Predicate::none());
    }

    #[test]
    fn value_is_formatted_as_literal() {
        let image = first_image(r#"<P><IMAGE ValuationUseType="Owner's"/></P>"#);
        let config = Config::default();
        let predicate = PredicateBuilder::new(&config).predicate_for(&image);
        assert_eq!(predicate.as_str(), "[@ValuationUseType=\"Owner's\"]");
    }
}
