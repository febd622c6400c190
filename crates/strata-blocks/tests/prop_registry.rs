use proptest::prelude::*;
use strata_blocks::{AIR, BlockRegistry, RenderGroup, Shape};

const SMALL: &str = r#"
[atlas]
tiles_per_row = 4
textures = ["a", "b", "c"]

[[blocks]]
name = "rock"
textures = "a"

[[blocks]]
name = "pillar"
textures = { top = "b", side = "c" }

[[blocks]]
name = "fern"
shape = "cross"
textures = "c"

[[blocks]]
name = "half"
shape = { model = [[0, 0, 0, 16, 8, 16]] }
textures = "a"
"#;

#[test]
fn ids_follow_declaration_order() {
    let reg = BlockRegistry::from_toml_str(SMALL).expect("registry");
    assert_eq!(reg.id_by_name("air"), Some(AIR));
    assert_eq!(reg.id_by_name("rock"), Some(1));
    assert_eq!(reg.id_by_name("pillar"), Some(2));
    assert_eq!(reg.id_by_name("fern"), Some(3));
    assert_eq!(reg.len(), 5);
}

#[test]
fn bottom_texture_falls_back_to_top() {
    let reg = BlockRegistry::from_toml_str(SMALL).unwrap();
    let pillar = reg.resolve(reg.id_by_name("pillar").unwrap());
    assert_eq!(pillar.faces.bottom, pillar.faces.top);
    assert_ne!(pillar.faces.side, pillar.faces.top);
}

#[test]
fn shapes_pick_their_groups_and_defaults() {
    let reg = BlockRegistry::from_toml_str(SMALL).unwrap();
    let fern = reg.resolve(reg.id_by_name("fern").unwrap());
    assert_eq!(fern.group(), RenderGroup::Plant);
    assert!(!fern.solid);
    let half = reg.resolve(reg.id_by_name("half").unwrap());
    assert!(!half.solid);
    assert!(half.collidable);
    match &half.shape {
        Shape::Model { boxes } => {
            assert_eq!(boxes.len(), 1);
            assert_eq!(boxes[0].max, [1.0, 0.5, 1.0]);
        }
        other => panic!("unexpected shape {other:?}"),
    }
}

#[test]
fn unknown_texture_is_an_error() {
    let bad = r#"
[atlas]
textures = ["a"]

[[blocks]]
name = "x"
textures = "nope"
"#;
    assert!(BlockRegistry::from_toml_str(bad).is_err());
}

#[test]
fn duplicate_explicit_id_is_an_error() {
    let bad = r#"
[atlas]
textures = ["a"]

[[blocks]]
name = "x"
id = 3
textures = "a"

[[blocks]]
name = "y"
id = 3
textures = "a"
"#;
    assert!(BlockRegistry::from_toml_str(bad).is_err());
}

proptest! {
    // Every id, registered or not, resolves without panicking; only id 0 and gaps are air.
    #[test]
    fn resolve_is_total(id in any::<u8>()) {
        let reg = BlockRegistry::builtin().unwrap();
        let ty = reg.resolve(id);
        if usize::from(id) >= reg.len() {
            prop_assert!(ty.is_air());
        } else {
            prop_assert_eq!(ty.id, id);
        }
    }
}
