mod common;

use alma::operators::{AddItems, Counter, Creator, List};
use alma::{
    Engine, KernelError, ListConfig, Model, OpKey, OpTree, Operator, PreconditionViolation,
    TestPresenter,
};
use common::TestEngine;
use serde_json::{json, Value};

fn counter() -> Box<dyn Operator> {
    Box::new(Counter::new())
}

fn start_with_list(list: List) -> (TestEngine, OpKey) {
    let mut t = TestEngine::start(OpTree::branch());
    let key = t.model().insert_op(list);
    t.model()
        .mount_op_tree(OpTree::branch().with("list", key))
        .unwrap();
    (t, key)
}

fn counters(model: &mut Model, n: usize) -> Vec<OpKey> {
    (0..n).map(|_| model.insert_op(Counter::new())).collect()
}

fn add(model: &mut Model, list: OpKey, index: i64, ops: &[OpKey]) -> Vec<u64> {
    model
        .with_op(list, |l: &mut List, cx| {
            l.add_items(cx, index, ops, AddItems::reset_ops())
        })
        .unwrap()
}

fn id_of(model: &Model, list: OpKey, op: OpKey) -> Option<u64> {
    model.op::<List>(list).unwrap().get_id_for(op)
}

fn order(model: &Model, list: OpKey) -> Value {
    model.get_model_data_or(list, &["order"], json!([])).unwrap()
}

#[test]
fn reset_on_empty_list_commits_empty_layout() {
    let (mut t, list) = start_with_list(List::new());
    t.model().reset_op(list).unwrap();
    assert_eq!(t.state(), json!({"list": {"order": [], "items": {}, "opNames": {}}}));
}

#[test]
fn add_items_assigns_distinct_ids_in_order() {
    let (mut t, list) = start_with_list(List::new());
    let model = t.model();
    let ops = counters(model, 2);
    add(model, list, List::END, &ops);

    let a = id_of(model, list, ops[0]).unwrap();
    let b = id_of(model, list, ops[1]).unwrap();
    assert_ne!(a, b);
    assert_eq!(order(model, list), json!([a, b]));
    assert_eq!(model.nested_ops(list), ops);
    assert_eq!(
        model.op::<List>(list).unwrap().get_item_by_id(b),
        Some(ops[1])
    );

    let state = t.state();
    assert_eq!(state["list"]["opNames"], json!({a.to_string(): "Counter", b.to_string(): "Counter"}));
    assert_eq!(state["list"]["items"][a.to_string()], json!({"value": 0}));
}

#[test]
fn add_items_clamps_index() {
    let (mut t, list) = start_with_list(List::new());
    let model = t.model();
    let ops = counters(model, 6);
    let first = add(model, list, List::END, &ops[0..2]);
    let middle = add(model, list, 1, &ops[2..4]);
    let last = add(model, list, List::END, &ops[4..5]);
    let front = add(model, list, -1, &ops[5..6]);

    assert_eq!(
        order(model, list),
        json!([front[0], first[0], middle[0], middle[1], first[1], last[0]])
    );
}

#[test]
fn add_items_resumes_above_persisted_ids() {
    let presenter = TestPresenter::new();
    let data = json!({"list": {"order": [1, 4, 3, 2, 5]}});
    let mut engine = Engine::with_model(presenter, Model::with_data(data));
    let model = engine.model_mut();
    let list = model.insert_op(List::new());
    model
        .mount_op_tree(OpTree::branch().with("list", list))
        .unwrap();

    let op = model.insert_op(Counter::new());
    add(model, list, List::END, &[op]);
    assert_eq!(id_of(model, list, op), Some(6));
    assert_eq!(order(model, list), json!([1, 4, 3, 2, 5, 6]));
}

#[test]
fn mount_rebuilds_children_from_op_names() {
    let data = json!({"list": {
        "order": [2, 7],
        "items": {"2": {"value": 5}, "7": {"value": -1}},
        "opNames": {"2": "Counter", "7": "Counter"},
    }});
    let mut engine = Engine::with_model(TestPresenter::new(), Model::with_data(data));
    let model = engine.model_mut();
    let list = model.insert_op(List::new().with_creators([("Counter", counter as Creator)]));
    model
        .mount_op_tree(OpTree::branch().with("list", list))
        .unwrap();

    let seven = model.op::<List>(list).unwrap().get_item_by_id(7).unwrap();
    assert!(model.is_mounted(seven));
    assert_eq!(model.op_name(seven).unwrap(), "Counter");
    assert_eq!(model.get_model_data(seven, &["value"]).unwrap(), Some(&json!(-1)));

    model
        .with_op(seven, |c: &mut Counter, cx| c.increment(cx))
        .unwrap();
    assert_eq!(model.get(&alma::to_path(["list", "items", "7", "value"])), Some(&json!(0)));

    let op = model.insert_op(Counter::new());
    assert_eq!(add(model, list, List::END, &[op]), vec![8]);
}

#[test]
fn mount_without_creator_fails() {
    let data = json!({"list": {"order": [1], "opNames": {"1": "Gauge"}}});
    let mut engine = Engine::with_model(TestPresenter::new(), Model::with_data(data));
    let model = engine.model_mut();
    let list = model.insert_op(List::new().with_creators([("Counter", counter as Creator)]));
    assert_eq!(
        model.mount(list, alma::to_path(["list"]), None),
        Err(PreconditionViolation::MissingCreator("Gauge".to_string()).into())
    );
}

#[test]
fn mount_skips_ids_without_op_name() {
    let data = json!({"list": {"order": [1, 2], "opNames": {"2": "Counter"}}});
    let mut engine = Engine::with_model(TestPresenter::new(), Model::with_data(data));
    let model = engine.model_mut();
    let list = model.insert_op(List::new().with_creators([("Counter", counter as Creator)]));
    model.mount(list, alma::to_path(["list"]), None).unwrap();

    let list_op = model.op::<List>(list).unwrap();
    assert!(list_op.get_item_by_id(1).is_none());
    assert!(list_op.get_item_by_id(2).is_some());
}

#[test]
fn delete_items_unmounts_child() {
    let (mut t, list) = start_with_list(List::new());
    let model = t.model();
    let ops = counters(model, 3);
    let ids = add(model, list, List::END, &ops);

    model
        .with_op(list, |l: &mut List, cx| l.delete_items(cx, &ops[0..1]))
        .unwrap();

    let unmounted = KernelError::UnmountedOperator("Counter".to_string());
    assert_eq!(
        model.with_op(ops[0], |c: &mut Counter, cx| c.increment(cx)),
        Err(unmounted.clone())
    );
    assert_eq!(model.get_model_data(ops[0], &["value"]), Err(unmounted));
    assert_eq!(order(model, list), json!([ids[1], ids[2]]));
    assert_eq!(id_of(model, list, ops[0]), None);
    assert_eq!(model.nested_ops(list), ops[1..].to_vec());

    let state = t.state();
    let items = state["list"]["items"].as_object().unwrap();
    assert!(!items.contains_key(&ids[0].to_string()));
    assert!(items.contains_key(&ids[1].to_string()));
    assert!(!state["list"]["opNames"]
        .as_object()
        .unwrap()
        .contains_key(&ids[0].to_string()));
}

#[test]
fn deleted_ids_are_not_reused() {
    let (mut t, list) = start_with_list(List::new());
    let model = t.model();
    let ops = counters(model, 3);
    let ids = add(model, list, List::END, &ops[0..2]);
    model
        .with_op(list, |l: &mut List, cx| l.delete_items(cx, &ops[1..2]))
        .unwrap();

    let next = add(model, list, List::END, &ops[2..3]);
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(next, vec![3]);
}

#[test]
fn move_items_reorders_only() {
    let (mut t, list) = start_with_list(List::new());
    let model = t.model();
    let ops = counters(model, 5);
    let ids = add(model, list, List::END, &ops);
    let items_before = t.state()["list"]["items"].clone();

    let model = t.model();
    model
        .with_op(list, |l: &mut List, cx| l.move_items(cx, &ops[2..3], 0))
        .unwrap();
    assert_eq!(order(model, list), json!([ids[2], ids[0], ids[1], ids[3], ids[4]]));
    assert_eq!(id_of(model, list, ops[2]), Some(ids[2]));
    assert_eq!(t.state()["list"]["items"], items_before);

    let model = t.model();
    let moved = [ops[2], ops[1], ops[4]];
    model
        .with_op(list, |l: &mut List, cx| l.move_items(cx, &moved, List::END))
        .unwrap();
    assert_eq!(order(model, list), json!([ids[0], ids[3], ids[2], ids[1], ids[4]]));
}

#[test]
fn clear_unmounts_everything_and_restarts_ids() {
    let (mut t, list) = start_with_list(List::new());
    let model = t.model();
    let ops = counters(model, 3);
    add(model, list, List::END, &ops[0..2]);

    model
        .with_op(list, |l: &mut List, cx| l.clear(cx))
        .unwrap();
    assert!(!model.is_mounted(ops[0]));
    assert!(!model.is_mounted(ops[1]));
    assert!(model.nested_ops(list).is_empty());
    assert_eq!(t.state(), json!({"list": {"order": [], "items": {}, "opNames": {}}}));

    let model = t.model();
    assert_eq!(add(model, list, List::END, &ops[2..3]), vec![1]);
}

#[test]
fn list_reset_resets_children() {
    let (mut t, list) = start_with_list(List::new());
    let model = t.model();
    let ops = counters(model, 2);
    let ids = add(model, list, List::END, &ops);
    model
        .with_op(ops[0], |c: &mut Counter, cx| c.set_value(cx, 9))
        .unwrap();

    model.reset_op(list).unwrap();
    assert_eq!(order(model, list), json!(ids));
    assert_eq!(model.get_model_data(ops[0], &["value"]).unwrap(), Some(&json!(0)));
}

#[test]
fn add_items_rejects_operators_already_in_use() {
    let (mut t, list) = start_with_list(List::new());
    let model = t.model();
    let ops = counters(model, 2);
    add(model, list, List::END, &ops[0..1]);

    let again = model.with_op(list, |l: &mut List, cx| {
        l.add_items(cx, List::END, &ops[0..1], AddItems::default())
    });
    assert_eq!(again, Err(PreconditionViolation::AlreadyNested(ops[0]).into()));

    let twice = model.with_op(list, |l: &mut List, cx| {
        l.add_items(cx, List::END, &[ops[1], ops[1]], AddItems::default())
    });
    assert_eq!(twice, Err(PreconditionViolation::AlreadyNested(ops[1]).into()));
    assert_eq!(order(model, list).as_array().map(Vec::len), Some(1));
}

#[test]
fn add_items_context_reaches_the_action() {
    let (mut t, list) = start_with_list(List::new());
    let model = t.model();
    let op = model.insert_op(Counter::new());
    let mut options = AddItems::default();
    options
        .context
        .insert("origin".to_string(), json!("palette"));
    model
        .with_op(list, |l: &mut List, cx| l.add_items(cx, List::END, &[op], options))
        .unwrap();

    // Without resetOps the child is mounted but never writes its value.
    assert!(model.is_mounted(op));
    assert_eq!(model.get_model_data(op, &["value"]).unwrap(), None);
}

#[test]
fn exhausted_sequence_without_wrap() {
    let config = ListConfig {
        start: 1,
        max: 2,
        wrap: false,
    };
    let (mut t, list) = start_with_list(List::with_config(config));
    let model = t.model();
    let ops = counters(model, 2);
    add(model, list, List::END, &ops[0..1]);
    let result = model.with_op(list, |l: &mut List, cx| {
        l.add_items(cx, List::END, &ops[1..2], AddItems::default())
    });
    assert_eq!(result, Err(PreconditionViolation::SequenceExhausted(2).into()));
}

#[test]
fn failed_add_records_nothing() {
    let mut model = Model::new();
    let list = model.insert_op(List::new());
    model.mount(list, alma::to_path(["list"]), None).unwrap();
    let op = model.insert_op(Counter::new());

    let result = model.with_op(list, |l: &mut List, cx| {
        l.add_items(cx, List::END, &[op], AddItems::reset_ops())
    });
    assert_eq!(result, Err(PreconditionViolation::MissingSupervisor.into()));
    assert_eq!(id_of(&model, list, op), None);
    assert_eq!(model.op::<List>(list).unwrap().get_item_by_id(1), None);

    model.set_supervisor(alma::Supervisor::new(TestPresenter::new()));
    assert_eq!(add(&mut model, list, List::END, &[op]), vec![1]);
    assert_eq!(id_of(&model, list, op), Some(1));
    assert!(model.is_mounted(op));
}

#[test]
fn rebuilt_children_are_dropped_on_delete_and_clear() {
    let data = json!({"list": {
        "order": [1, 2, 3],
        "opNames": {"1": "Counter", "2": "Counter", "3": "Counter"},
    }});
    let mut engine = Engine::with_model(TestPresenter::new(), Model::with_data(data));
    let model = engine.model_mut();
    let list = model.insert_op(List::new().with_creators([("Counter", counter as Creator)]));
    model
        .mount_op_tree(OpTree::branch().with("list", list))
        .unwrap();
    assert_eq!(model.op_count(), 4);

    let first = model.op::<List>(list).unwrap().get_item_by_id(1).unwrap();
    model
        .with_op(list, |l: &mut List, cx| l.delete_items(cx, &[first]))
        .unwrap();
    assert!(!model.contains_op(first));
    assert_eq!(model.op_count(), 3);

    // Operators handed in by the caller stay alive after a clear.
    let mine = model.insert_op(Counter::new());
    add(model, list, List::END, &[mine]);
    model
        .with_op(list, |l: &mut List, cx| l.clear(cx))
        .unwrap();
    assert_eq!(model.op_count(), 2);
    assert!(model.contains_op(mine));
    assert!(!model.is_mounted(mine));
}
