/// A selector split into the pieces the materializer needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector<'a> {
    pub tag: &'a str,
    pub id: Option<&'a str>,
    pub classes: Vec<&'a str>,
}

/// Split `tag#id.class1.class2` into tag, id and classes.
///
/// The tag runs to the first `#` or `.`. An id is only recognised when its `#` comes before
/// every `.`; it runs to the next `.`. Everything after that is dot-separated classes, with
/// empty segments dropped. Malformed input is not rejected: `#main` yields an empty tag.
pub fn parse(sel: &str) -> Selector<'_> {
    let tag_end = sel.find(['#', '.']).unwrap_or(sel.len());
    let tag = &sel[..tag_end];
    let mut rest = &sel[tag_end..];

    let mut id = None;
    if let Some(after_hash) = rest.strip_prefix('#') {
        let id_end = after_hash.find('.').unwrap_or(after_hash.len());
        id = Some(&after_hash[..id_end]);
        rest = &after_hash[id_end..];
    }

    let classes = rest.split('.').filter(|c| !c.is_empty()).collect();
    Selector { tag, id, classes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_tag() {
        let s = parse("div");
        assert_eq!(s.tag, "div");
        assert_eq!(s.id, None);
        assert!(s.classes.is_empty());
    }

    #[test]
    fn tag_id_and_classes() {
        let s = parse("span#title.big.red");
        assert_eq!(s.tag, "span");
        assert_eq!(s.id, Some("title"));
        assert_eq!(s.classes, vec!["big", "red"]);
    }

    #[test]
    fn classes_without_id() {
        let s = parse("li.item..active");
        assert_eq!(s.tag, "li");
        assert_eq!(s.id, None);
        assert_eq!(s.classes, vec!["item", "active"]);
    }

    #[test]
    fn hash_after_dot_stays_in_class() {
        let s = parse("div.a#b");
        assert_eq!(s.tag, "div");
        assert_eq!(s.id, None);
        assert_eq!(s.classes, vec!["a#b"]);
    }

    #[test]
    fn missing_tag_is_empty() {
        let s = parse("#main.wide");
        assert_eq!(s.tag, "");
        assert_eq!(s.id, Some("main"));
        assert_eq!(s.classes, vec!["wide"]);
    }
}
