use vdom::{
    AttrChange, AttrValue, Attributes, BuildError, Child, Element, Snapshot, TEXT_TAG,
    TEXT_VALUE_KEY, compare_trees, create_element, text,
};

#[test]
fn nested_declarations_build_the_expected_shape() {
    let tree = create_element(
        "div",
        [("id", "foo")],
        [
            Child::from(create_element("a", Attributes::new(), ["bar"]).unwrap()),
            Child::from(create_element("b", Attributes::new(), [] as [Child; 0]).unwrap()),
        ],
    )
    .unwrap();

    assert_eq!(tree.tag(), "div");
    assert_eq!(tree.children().len(), 2);
    let bar = &tree.children()[0].children()[0];
    assert_eq!(bar.tag(), TEXT_TAG);
    assert_eq!(bar.attributes().get(TEXT_VALUE_KEY), Some(&AttrValue::from("bar")));
    assert!(tree.children()[1].children().is_empty());
    assert_eq!(
        Snapshot::of(&tree).render(),
        "<div id=\"foo\">\n  <a>\n    \"bar\"\n  <b>"
    );
}

#[test]
fn mixed_primitive_children_become_text_nodes() {
    let node = Element::builder("p")
        .child("n=")
        .child(3i64)
        .child(0.5f64)
        .child(true)
        .build()
        .unwrap();
    let expected = [text("n="), text("3"), text("0.5"), text("true")];
    assert!(compare_trees(node.children(), &expected, Default::default()).is_ok());
}

#[test]
fn diff_is_empty_only_for_equal_attribute_sets() {
    let base = Attributes::from([("id", "x")]);
    assert_eq!(Attributes::diff(&base, &base).count(), 0);

    let changed = Attributes::new().with("id", "x").with("hidden", true);
    let changes: Vec<_> = Attributes::diff(&base, &changed).collect();
    assert_eq!(
        changes,
        [AttrChange::Set {
            key: "hidden",
            value: &AttrValue::Bool(true)
        }]
    );
    let back: Vec<_> = Attributes::diff(&changed, &base).collect();
    assert_eq!(back, [AttrChange::Remove { key: "hidden" }]);
}

#[test]
fn invalid_descriptions_never_produce_elements() {
    let err = create_element("bad tag", Attributes::new(), [] as [Child; 0]).unwrap_err();
    assert_eq!(err, BuildError::MalformedTag("bad tag".to_string()));
    assert!(err.to_string().contains("invalid description"));
    assert!(matches!(
        Element::builder("#container").build(),
        Err(BuildError::ReservedTag(_))
    ));
}
