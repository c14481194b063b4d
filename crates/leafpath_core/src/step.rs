/// Render one location step: `name`, its predicate, then `[index]`.
///
/// Index 1 is XPath's default position and is left out unless
/// `always_show_index` is set.
pub fn step(name: &str, predicate: &str, index: usize, always_show_index: bool) -> String {
    if always_show_index || index > 1 {
        format!("{name}{predicate}[{index}]")
    } else {
        format!("{name}{predicate}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_instance_has_no_index() {
        assert_eq!(step("d:PROPERTY", "", 1, false), "d:PROPERTY");
    }

    #[test]
    fn later_instances_are_indexed() {
        assert_eq!(
            step("d:IMAGE", "[@ValuationUseType='Exterior']", 3, false),
            "d:IMAGE[@ValuationUseType='Exterior'][3]"
        );
    }

    #[test]
    fn index_can_be_forced() {
        assert_eq!(step("d:PROPERTY", "", 1, true), "d:PROPERTY[1]");
    }
}
