//! Object-tree and property opcodes.

use super::{store_result, take_branch, value_of};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::instruction::Instruction;

fn warn_object_zero(engine: &mut Engine, site: &str, op: &str) {
    engine
        .warnings
        .warn_once(site, format!("{op} called on object 0"));
}

pub fn execute(engine: &mut Engine, instr: &Instruction) -> Result<(), EngineError> {
    match instr.name {
        "jin" => {
            let obj = value_of(engine, &instr.operands[0]);
            let other = value_of(engine, &instr.operands[1]);
            let parent = engine.store.parent(&engine.memory, obj);
            take_branch(engine, instr, parent == other);
        }
        "test_attr" => {
            let obj = value_of(engine, &instr.operands[0]);
            let attr = value_of(engine, &instr.operands[1]);
            let set = if obj == 0 {
                warn_object_zero(engine, "test_attr/obj0", "test_attr");
                false
            } else {
                engine.store.attribute(&engine.memory, obj, attr)
            };
            take_branch(engine, instr, set);
        }
        "set_attr" => {
            let obj = value_of(engine, &instr.operands[0]);
            let attr = value_of(engine, &instr.operands[1]);
            if obj == 0 {
                warn_object_zero(engine, "set_attr/obj0", "set_attr");
            } else {
                engine.store.set_attribute(&mut engine.memory, obj, attr, true);
            }
        }
        "clear_attr" => {
            let obj = value_of(engine, &instr.operands[0]);
            let attr = value_of(engine, &instr.operands[1]);
            if obj == 0 {
                warn_object_zero(engine, "clear_attr/obj0", "clear_attr");
            } else {
                engine.store.set_attribute(&mut engine.memory, obj, attr, false);
            }
        }
        "insert_obj" => {
            let obj = value_of(engine, &instr.operands[0]);
            let dest = value_of(engine, &instr.operands[1]);
            if obj == 0 || dest == 0 {
                warn_object_zero(engine, "insert_obj/obj0", "insert_obj");
            } else {
                let store = &*engine.store;
                crate::object::insert(store, &mut engine.memory, obj, dest);
            }
        }
        "remove_obj" => {
            let obj = value_of(engine, &instr.operands[0]);
            if obj == 0 {
                warn_object_zero(engine, "remove_obj/obj0", "remove_obj");
            } else {
                let store = &*engine.store;
                crate::object::remove(store, &mut engine.memory, obj);
            }
        }
        "get_sibling" => {
            let obj = value_of(engine, &instr.operands[0]);
            let sibling = if obj == 0 {
                warn_object_zero(engine, "get_sibling/obj0", "get_sibling");
                0
            } else {
                engine.store.sibling(&engine.memory, obj)
            };
            store_result(engine, instr, sibling);
            take_branch(engine, instr, sibling != 0);
        }
        "get_child" => {
            let obj = value_of(engine, &instr.operands[0]);
            let child = if obj == 0 {
                warn_object_zero(engine, "get_child/obj0", "get_child");
                0
            } else {
                engine.store.child(&engine.memory, obj)
            };
            store_result(engine, instr, child);
            take_branch(engine, instr, child != 0);
        }
        "get_parent" => {
            let obj = value_of(engine, &instr.operands[0]);
            let parent = if obj == 0 {
                warn_object_zero(engine, "get_parent/obj0", "get_parent");
                0
            } else {
                engine.store.parent(&engine.memory, obj)
            };
            store_result(engine, instr, parent);
        }
        "get_prop" => {
            let obj = value_of(engine, &instr.operands[0]);
            let prop = value_of(engine, &instr.operands[1]);
            let value = if obj == 0 {
                warn_object_zero(engine, "get_prop/obj0", "get_prop");
                0
            } else {
                engine.store.get_property(&engine.memory, obj, prop)
            };
            store_result(engine, instr, value);
        }
        "get_prop_addr" => {
            let obj = value_of(engine, &instr.operands[0]);
            let prop = value_of(engine, &instr.operands[1]);
            let addr = if obj == 0 {
                0
            } else {
                engine.store.get_property_address(&engine.memory, obj, prop)
            };
            store_result(engine, instr, addr);
        }
        "get_prop_len" => {
            let addr = value_of(engine, &instr.operands[0]);
            let len = engine.store.get_property_length(&engine.memory, addr);
            store_result(engine, instr, len);
        }
        "get_next_prop" => {
            let obj = value_of(engine, &instr.operands[0]);
            let prop = value_of(engine, &instr.operands[1]);
            let next = if obj == 0 {
                0
            } else {
                engine.store.get_next_property(&engine.memory, obj, prop)
            };
            store_result(engine, instr, next);
        }
        "put_prop" => {
            let obj = value_of(engine, &instr.operands[0]);
            let prop = value_of(engine, &instr.operands[1]);
            let value = value_of(engine, &instr.operands[2]);
            if obj == 0 {
                warn_object_zero(engine, "put_prop/obj0", "put_prop");
            } else {
                let store = &*engine.store;
                store.put_property(&mut engine.memory, obj, prop, value, &mut engine.warnings);
            }
        }
        "print_obj" => {
            let obj = value_of(engine, &instr.operands[0]);
            let addr = engine.store.short_name_addr(&engine.memory, obj);
            let abbrev = engine.memory.header().abbrev_table;
            let unicode_table = engine.memory.unicode_table();
            let (text, _) = crate::zstring::decode(
                &engine.memory,
                addr,
                engine.memory.len() as u32,
                abbrev,
                unicode_table.as_deref(),
            );
            engine.emit_text(text);
        }
        _ => unreachable!(),
    }
    Ok(())
}
