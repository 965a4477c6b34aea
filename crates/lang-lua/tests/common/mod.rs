use luasense_api::MemoryCatalog;
use luasense_lua::{VariableTable, VariableTableBuilder};

/// Catalog shared by the behaviour tests.
///
/// Mirrors the shape of the editor's API dump: a singleton entry point, a
/// controller, game objects and a few value classes.
#[allow(dead_code)]
pub fn game_catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .with_singleton("AppStateManager")
        .with_method(
            "AppStateManager",
            "getGameObjectController",
            "()",
            "GameObjectController",
        )
        .with_singleton("AiController")
        .with_class("GameObjectController")
        .with_documented_method(
            "GameObjectController",
            "getFromId",
            "(string id)",
            "(GameObject)",
            "Looks up a game object by its id.",
        )
        .with_method("GameObjectController", "getAll", "()", "Table[number][GameObject]")
        .with_method("GameObject", "getName", "()", "string")
        .with_documented_method(
            "GameObject",
            "setPosition",
            "(number x, number y)",
            "void",
            "Moves the object.",
        )
        .with_method("GameObject", "getComponent", "(string name)", "Component")
        .with_method("Component", "getOwner", "()", "GameObject")
        .with_method("PhysicsComponent", "setMass", "(number mass)", "void")
        .inherits("PhysicsComponent", "Component")
        .with_constant("Vector3", "UNIT_X")
        .with_constant("Vector3", "UNIT_Y")
        .with_method("Vector3", "new", "(number x, number y, number z)", "Vector3")
        .with_method("Vector3", "length", "()", "number")
        .with_method("ClassA", "m1", "()", "ClassB")
        .with_method("ClassA", "m2", "()", "ClassC")
        .with_method("ClassA", "methodX", "()", "ClassB")
        .with_method("ClassB", "next", "()", "ClassC")
        .with_method("ClassB", "onlyOnB", "()", "void")
        .with_method("ClassC", "onlyOnC", "()", "void")
}

#[allow(dead_code)]
pub fn build_table(catalog: &MemoryCatalog, text: &str) -> VariableTable {
    VariableTableBuilder::new(catalog).build(text)
}
