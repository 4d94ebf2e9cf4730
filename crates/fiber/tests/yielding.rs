use dom::Dom;
use fiber::{Deadline, Renderer, Tick, TimeBudget, Unbounded, UnitBudget};
use std::time::Duration;
use vdom::assert_trees_eq;
use vdom::fixtures::{balanced_tree, expected_node_count, wide_list};
use vdom::traverse::count_nodes;

/// Drive `renderer` to completion, building a fresh budget per tick.
fn drive<B: TimeBudget>(
    renderer: &mut Renderer<dom::NodeKey>,
    dom: &mut Dom,
    mut budget: impl FnMut() -> B,
) -> Vec<Tick> {
    let mut ticks = Vec::new();
    loop {
        let tick = renderer.tick(dom, &mut budget()).unwrap();
        ticks.push(tick);
        if tick.is_done() {
            return ticks;
        }
    }
}

#[test]
fn unit_count_is_independent_of_tick_splitting() {
    for (depth, breadth) in [(2, 2), (3, 3), (4, 2)] {
        let expected = expected_node_count(depth, breadth);
        for per_tick in [1usize, 7, usize::MAX] {
            let mut dom = Dom::new();
            let container = dom.create_container();
            let mut renderer = Renderer::default();
            renderer.render(balanced_tree(depth, breadth), container);

            let ticks = drive(&mut renderer, &mut dom, || UnitBudget::new(per_tick));
            let units: usize = ticks.iter().map(|t| t.units()).sum();
            assert_eq!(units, expected + 1, "depth={depth} breadth={breadth} per_tick={per_tick}");
            assert!(ticks.iter().all(|t| t.units() <= per_tick));
            assert_eq!(renderer.last_commit().unwrap().work_units, expected);
        }
    }
}

#[test]
fn one_unit_per_tick_across_hundreds_of_ticks() {
    let list = wide_list(150, "row");
    let total = count_nodes(&list) + 1;
    let mut dom = Dom::new();
    let container = dom.create_container();
    let mut renderer = Renderer::default();
    renderer.render(list.clone(), container);

    for i in 0..total - 1 {
        let tick = renderer.tick(&mut dom, &mut UnitBudget::new(1)).unwrap();
        assert_eq!(tick, Tick::Yielded { units: 1 }, "tick {i}");
        assert!(renderer.next_unit().is_some());
        assert!(renderer.current().is_none());
        assert_eq!(dom.stats().appends, 0);
    }
    let last = renderer.tick(&mut dom, &mut UnitBudget::new(1)).unwrap();
    assert_eq!(last, Tick::Committed { units: 1 });
    assert!(renderer.is_idle());
    assert_eq!(renderer.stats().ticks as usize, total);
    assert_trees_eq(&[list], &dom.materialize_children(container).unwrap());
}

#[test]
fn first_unit_runs_even_with_no_time_left() {
    let mut dom = Dom::new();
    let container = dom.create_container();
    let mut renderer = Renderer::default();
    renderer.render(balanced_tree(1, 2), container);

    let tick = renderer.tick(&mut dom, &mut || Duration::ZERO).unwrap();
    assert_eq!(tick, Tick::Yielded { units: 1 });
    let tick = renderer
        .tick(&mut dom, &mut Deadline::after(Duration::ZERO))
        .unwrap();
    assert_eq!(tick, Tick::Yielded { units: 1 });
}

#[test]
fn threshold_decides_when_to_yield() {
    let mut dom = Dom::new();
    let container = dom.create_container();
    let mut renderer = Renderer::default();
    renderer.render(balanced_tree(2, 2), container);

    // Half a millisecond is below the default 1 ms threshold.
    let tick = renderer
        .tick(&mut dom, &mut || Duration::from_micros(500))
        .unwrap();
    assert_eq!(tick.units(), 1);
    let tick = renderer
        .tick(&mut dom, &mut || Duration::from_millis(2))
        .unwrap();
    assert!(matches!(tick, Tick::Committed { .. }));
}

#[test]
fn yielded_work_resumes_at_the_same_unit() {
    let mut dom = Dom::new();
    let container = dom.create_container();
    let mut renderer = Renderer::default();
    renderer.render(balanced_tree(2, 3), container);

    let mut seen = Vec::new();
    while !renderer.is_idle() {
        let before = renderer.next_unit();
        let tick = renderer.tick(&mut dom, &mut UnitBudget::new(3)).unwrap();
        if let Some(before) = before {
            seen.push(before);
        }
        if let Tick::Yielded { .. } = tick {
            let wip = renderer.work_in_progress().unwrap();
            let next = wip.next_unit().unwrap();
            assert!(wip.tree().get(next).is_some());
            assert!(!seen.contains(&next));
        }
    }
    assert_eq!(renderer.tick(&mut dom, &mut Unbounded).unwrap(), Tick::Idle);
}
