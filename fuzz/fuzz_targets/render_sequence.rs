#![no_main]

use dom::{Dom, NodeKey};
use fiber::{Effect, FiberTree, Renderer, UnitBudget};
use libfuzzer_sys::fuzz_target;
use vdom::traverse::{count_nodes, preorder};
use vdom::{Element, text};

const TAGS: [&str; 3] = ["div", "span", "p"];
const MAX_DEPTH: usize = 4;
const MAX_RENDERS: usize = 16;

struct Bytes<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Bytes<'_> {
    fn next(&mut self) -> u8 {
        let byte = self.data.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        byte
    }

    fn exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }
}

fn gen_element(bytes: &mut Bytes<'_>, depth: usize) -> Element {
    let byte = bytes.next();
    if depth > 0 && byte % 4 == 3 {
        return text(format!("t{}", byte / 4));
    }
    let mut builder = Element::builder(TAGS[usize::from(byte % 4) % TAGS.len()]);
    let attrs = bytes.next();
    if attrs & 1 != 0 {
        builder = builder.attr("id", i64::from(attrs >> 1));
    }
    if depth < MAX_DEPTH {
        for _ in 0..bytes.next() % 4 {
            builder = builder.child(gen_element(bytes, depth + 1));
        }
    }
    match builder.build() {
        Ok(element) => element,
        Err(err) => panic!("generated tags are valid: {err}"),
    }
}

/// The committed fiber tree mirrors `description` and every fiber's handle
/// sits under its nearest ancestor handle in the display tree.
fn check_committed(tree: &FiberTree<NodeKey>, description: &Element, dom: &Dom) {
    let fiber_tags: Vec<&str> = tree
        .preorder()
        .skip(1)
        .filter_map(|id| tree.get(id).map(|f| f.tag()))
        .collect();
    let described: Vec<&str> = preorder(description).map(Element::tag).collect();
    assert_eq!(fiber_tags, described);
    assert_eq!(tree.len(), count_nodes(description) + 1);

    for id in tree.preorder().skip(1) {
        let Some(fiber) = tree.get(id) else {
            panic!("preorder yielded a missing fiber");
        };
        assert_eq!(fiber.effect(), Effect::None);
        assert!(fiber.alternate().is_none());
        let handle = fiber.handle().unwrap_or(NodeKey::INVALID);
        assert!(dom.contains(handle));
        assert_eq!(dom.parent(handle), tree.nearest_handle_above(id));

        let mut fiber_children = 0;
        let mut cursor = fiber.child();
        while let Some(child) = cursor {
            fiber_children += 1;
            cursor = tree.get(child.id()).and_then(|c| c.sibling());
        }
        assert_eq!(dom.children(handle).len(), fiber_children);
    }
}

fuzz_target!(|data: &[u8]| {
    let mut bytes = Bytes { data, pos: 0 };
    let mut dom = Dom::new();
    let container = dom.create_container();
    let mut renderer = Renderer::default();

    for _ in 0..MAX_RENDERS {
        if bytes.exhausted() {
            break;
        }
        let description = gen_element(&mut bytes, 0);
        renderer.render(description.clone(), container);

        // Optionally interrupt the build with another render.
        let interrupt_after = bytes.next() % 8;
        for _ in 0..interrupt_after {
            if renderer.is_idle() {
                break;
            }
            let units = usize::from(bytes.next() % 5) + 1;
            if renderer.tick(&mut dom, &mut UnitBudget::new(units)).is_err() {
                return;
            }
        }
        let description = if !renderer.is_idle() && bytes.next() % 2 == 0 {
            let replacement = gen_element(&mut bytes, 0);
            renderer.render(replacement.clone(), container);
            replacement
        } else {
            description
        };

        if renderer.flush(&mut dom).is_err() {
            return;
        }
        let Some(current) = renderer.current() else {
            panic!("flush left no current tree");
        };
        check_committed(current, &description, &dom);
        assert_eq!(dom.children(container).len(), 1);
    }
});
