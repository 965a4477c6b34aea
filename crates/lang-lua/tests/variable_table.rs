mod common;

use common::{build_table, game_catalog};
use luasense_api::models::VariableScope;
use luasense_lua::{MAX_INFERENCE_PASSES, VariableTableBuilder};

const SCRIPT: &str = r#"-- npc behaviour
local ctl = AppStateManager:getGameObjectController()
local npc = ctl:getFromId("npc_01")
local body = npc:getComponent("Physics"); local owner = body:getOwner()
local name = npc:getName()
local alias = npc
local all = ctl:getAll()
local first = all[1]
counter = 0
function onUpdate(dt)
    npc:setPosition(dt, 0)
end
"#;

#[test]
fn test_rebuild_is_idempotent() {
    let catalog = game_catalog();
    let first = build_table(&catalog, SCRIPT);
    let second = build_table(&catalog, SCRIPT);
    assert_eq!(first, second);
}

#[test]
fn test_chain_assignment_resolves_return_type() {
    let catalog = game_catalog();
    let table = build_table(&catalog, "local a = ClassA:methodX()");
    assert_eq!(table.get("a").unwrap().type_name, "ClassB");
}

#[test]
fn test_script_types() {
    let catalog = game_catalog();
    let table = build_table(&catalog, SCRIPT);

    let expect = [
        ("ctl", "GameObjectController"),
        ("npc", "GameObject"),
        ("body", "Component"),
        ("owner", "GameObject"),
        ("alias", "GameObject"),
        ("all", "Table[number][GameObject]"),
        ("first", "GameObject"),
        ("onUpdate", "function"),
    ];
    for (name, type_name) in expect {
        assert_eq!(table.get(name).unwrap().type_name, type_name, "type of {name}");
    }

    // Primitive returns end the object chain.
    assert_eq!(table.get("name").unwrap().type_name, "");
    assert_eq!(table.get("counter").unwrap().scope, VariableScope::Global);
    assert_eq!(table.get("dt").unwrap().scope, VariableScope::Function);
    assert_eq!(
        table.get("AppStateManager").unwrap().scope,
        VariableScope::Singleton
    );
    assert_eq!(table.get("npc").unwrap().declaration_line, 3);
}

#[test]
fn test_forward_reference_needs_extra_pass() {
    let catalog = game_catalog();
    let text = "local part = obj:getComponent(\"a\")\nobj = AppStateManager:getGameObjectController():getFromId(\"x\")";

    let (table, stats) = VariableTableBuilder::new(&catalog).build_with_stats(text);
    assert_eq!(stats.inference_passes, 2);
    assert_eq!(table.get("part").unwrap().type_name, "Component");

    let single = VariableTableBuilder::new(&catalog)
        .with_max_inference_passes(1)
        .build(text);
    assert_eq!(single.get("part").unwrap().type_name, "");
}

#[test]
fn test_extra_pass_only_moves_empty_to_resolved() {
    let catalog = game_catalog();
    let text = format!(
        "{SCRIPT}local part = later:getComponent(\"a\")\nlater = ctl:getFromId(\"late\")\nlocal unknown = mystery:call()"
    );

    let single = VariableTableBuilder::new(&catalog)
        .with_max_inference_passes(1)
        .build(&text);
    let (full, stats) = VariableTableBuilder::new(&catalog).build_with_stats(&text);

    assert_eq!(stats.inference_passes, MAX_INFERENCE_PASSES);
    for var in single.iter().filter(|v| v.has_type()) {
        let after = full.get(&var.name).unwrap();
        assert!(after.has_type(), "{} lost its type", var.name);
    }
    assert!(!single.get("part").unwrap().has_type());
    assert_eq!(full.get("part").unwrap().type_name, "Component");
}

#[test]
fn test_unresolvable_stays_empty_after_bounded_passes() {
    let catalog = game_catalog();
    let (table, stats) = VariableTableBuilder::new(&catalog)
        .build_with_stats("local a = mystery:call()\nlocal b = a");
    assert_eq!(stats.inference_passes, 2);
    assert_eq!(stats.untyped_remaining, 2);
    assert_eq!(table.get("b").unwrap().type_name, "");
}

#[test]
fn test_no_extra_pass_when_everything_is_typed() {
    let catalog = game_catalog();
    let (_, stats) = VariableTableBuilder::new(&catalog)
        .build_with_stats("local a = ClassA:methodX()\nlocal b = a");
    assert_eq!(stats.inference_passes, 1);
}

#[test]
fn test_cast_preserves_scope() {
    let catalog = game_catalog();
    let table = build_table(
        &catalog,
        "local thing = nil\nthing = cast(PhysicsComponent)(other)",
    );
    let thing = table.get("thing").unwrap();
    assert_eq!(thing.type_name, "PhysicsComponent");
    assert_eq!(thing.scope, VariableScope::Local);
}

#[test]
fn test_redeclaration_records_line_history() {
    let catalog = game_catalog();
    let table = build_table(&catalog, "local b = ClassA:m1()\nlocal b = ClassA:m2()");
    let b = table.get("b").unwrap();

    // Static type follows the last assignment; each line keeps its own.
    assert_eq!(b.type_name, "ClassC");
    assert_eq!(b.chain_type_history.len(), 2);
    assert_eq!(b.type_at(1, 30), "ClassB");
    assert_eq!(b.type_at(2, 30), "ClassC");
}

#[test]
fn test_bare_chain_keeps_root_type() {
    let catalog = game_catalog();
    let table = build_table(&catalog, "AppStateManager:getGameObjectController(); AppStateManager:");
    let root = table.get("AppStateManager").unwrap();
    assert_eq!(root.type_name, "AppStateManager");
    assert_eq!(root.chain_type_history.len(), 1);

    let recorded = &root.chain_type_history[0].positions[0];
    assert_eq!(recorded.type_name, "GameObjectController");
    assert!(recorded.result_only);
    assert_eq!(root.type_at(1, 60), "AppStateManager");
}

#[test]
fn test_dot_call_assignment_is_typed() {
    let catalog = game_catalog();
    let table = build_table(&catalog, "local v = Vector3.new(1, 2, 3)\nlocal w = v");
    assert_eq!(table.get("v").unwrap().type_name, "Vector3");
    assert_eq!(table.get("w").unwrap().type_name, "Vector3");
}

#[test]
fn test_multiline_literals_hide_declarations() {
    let catalog = game_catalog();
    let text = "--[[\nlocal hidden = AppStateManager:getGameObjectController()\n]]\n\
                local s = [[\nghost = 1\n]] local after = AppStateManager:getGameObjectController()";
    let table = build_table(&catalog, text);

    assert!(table.get("hidden").is_none());
    assert!(table.get("ghost").is_none());
    assert_eq!(table.get("s").unwrap().type_name, "");
    let after = table.get("after").unwrap();
    assert_eq!(after.type_name, "GameObjectController");
    assert_eq!(after.declaration_line, 6);
}

#[test]
fn test_crlf_lines() {
    let catalog = game_catalog();
    let table = build_table(&catalog, "local a = ClassA:methodX()\r\nlocal c = a:next()\r\n");
    assert_eq!(table.get("c").unwrap().type_name, "ClassC");
    assert_eq!(table.get("c").unwrap().declaration_line, 2);
}
