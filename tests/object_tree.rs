//! `insert_obj` driven through the engine, checked against the object store
//! directly rather than re-decoding memory by hand.

mod common;

use zengine::object::store_for_version;
use zengine::EngineState;

#[test]
fn insert_obj_moves_object_to_new_parent_detaching_from_the_old_one() {
    let table_addr: u16 = 0x40;
    let mut bytes = common::blank_story(3, 0x400, 0x300, 0x10);
    common::set_object_table_addr(&mut bytes, table_addr);
    common::write_object_table_v3(&mut bytes, table_addr, 4); // objects 1..=3 usable

    // obj 2 starts under obj 1; move it under obj 3, then quit.
    let addr = common::write_insert_obj(&mut bytes, 0x10, 2, 1);
    let addr = common::write_insert_obj(&mut bytes, addr, 2, 3);
    common::write_op0(&mut bytes, addr, 10); // quit

    let (mut engine, _events_rx) = common::make_engine(bytes);
    engine.run().expect("no fatal error");
    assert_eq!(engine.state(), EngineState::Halted);

    let store = store_for_version(3);
    assert_eq!(store.parent(engine.memory(), 2), 3);
    assert_eq!(store.child(engine.memory(), 3), 2);
    assert_eq!(store.child(engine.memory(), 1), 0); // detached from its first parent
    assert_eq!(store.sibling(engine.memory(), 2), 0);
}

#[test]
fn insert_obj_pushes_onto_an_existing_sibling_chain() {
    let table_addr: u16 = 0x40;
    let mut bytes = common::blank_story(3, 0x400, 0x300, 0x10);
    common::set_object_table_addr(&mut bytes, table_addr);
    common::write_object_table_v3(&mut bytes, table_addr, 4);

    // obj 2, then obj 3, both inserted under obj 1: obj 3 ends up the head,
    // with obj 2 as its sibling.
    let addr = common::write_insert_obj(&mut bytes, 0x10, 2, 1);
    let addr = common::write_insert_obj(&mut bytes, addr, 3, 1);
    common::write_op0(&mut bytes, addr, 10); // quit

    let (mut engine, _events_rx) = common::make_engine(bytes);
    engine.run().expect("no fatal error");

    let store = store_for_version(3);
    assert_eq!(store.child(engine.memory(), 1), 3);
    assert_eq!(store.sibling(engine.memory(), 3), 2);
    assert_eq!(store.sibling(engine.memory(), 2), 0);
    assert_eq!(store.parent(engine.memory(), 3), 1);
    assert_eq!(store.parent(engine.memory(), 2), 1);
}
