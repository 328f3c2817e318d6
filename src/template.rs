//! Vehicle templates: serializable blueprints instantiated into the world.
//!
//! A template is identified by the MD5 hash of its JSON encoding, so two
//! instances built from the same blueprint can be matched up across hosts.

use crate::entity::SpawnType;
use crate::types::{Borders, Vec2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Blueprints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentBlueprint {
    Steering,
    Door {
        #[serde(default)]
        open: bool,
    },
    DockingPort,
    ConnectionPanel {
        wires: usize,
    },
    PowerContainer {
        charge: f32,
        capacity: f32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemBlueprint {
    pub prefab: String,
    pub offset: Vec2,
    /// Fixtures (terminals, doors, panels) have no loose physics body.
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub components: Vec<ComponentBlueprint>,
}

impl ItemBlueprint {
    fn fixture(prefab: &str, offset: Vec2, components: Vec<ComponentBlueprint>) -> Self {
        Self {
            prefab: prefab.into(),
            offset,
            fixed: true,
            components,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WallBlueprint {
    pub sections: usize,
    pub max_health: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HullBlueprint {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GapBlueprint {
    /// Index into [`VehicleTemplate::walls`] of the wall this gap belongs to.
    pub wall: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WayPointBlueprint {
    pub offset: Vec2,
    pub spawn_type: SpawnType,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub id_card_tags: Vec<String>,
}

impl WayPointBlueprint {
    pub fn human(offset: Vec2, job: Option<&str>, tags: &[&str]) -> Self {
        Self {
            offset,
            spawn_type: SpawnType::Human,
            job: job.map(str::to_string),
            id_card_tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn cargo(offset: Vec2) -> Self {
        Self {
            offset,
            spawn_type: SpawnType::Cargo,
            job: None,
            id_card_tags: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleTemplate {
    pub name: String,
    pub borders: Borders,
    #[serde(default)]
    pub items: Vec<ItemBlueprint>,
    #[serde(default)]
    pub walls: Vec<WallBlueprint>,
    #[serde(default)]
    pub hulls: Vec<HullBlueprint>,
    #[serde(default)]
    pub gaps: Vec<GapBlueprint>,
    #[serde(default)]
    pub waypoints: Vec<WayPointBlueprint>,
}

impl VehicleTemplate {
    pub fn new(name: impl Into<String>, borders: Borders) -> Self {
        Self {
            name: name.into(),
            borders,
            items: Vec::new(),
            walls: Vec::new(),
            hulls: Vec::new(),
            gaps: Vec::new(),
            waypoints: Vec::new(),
        }
    }

    /// Hex MD5 digest of the template's JSON encoding.
    pub fn hash(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(format!("{:x}", md5::compute(bytes)))
    }

    /// The stock respawn shuttle: a steering terminal, two doors, a docking
    /// port, a locked-down junction box, a backup battery, four crew spawn
    /// points and a cargo spot.
    pub fn respawn_shuttle() -> Self {
        let mut t = Self::new("Respawn Shuttle", Borders::new(800.0, 400.0));
        t.items = vec![
            ItemBlueprint::fixture(
                "navterminal",
                Vec2::new(250.0, 50.0),
                vec![ComponentBlueprint::Steering],
            ),
            ItemBlueprint::fixture(
                "door",
                Vec2::new(-300.0, -100.0),
                vec![ComponentBlueprint::Door { open: false }],
            ),
            ItemBlueprint::fixture(
                "hatch",
                Vec2::new(0.0, 180.0),
                vec![ComponentBlueprint::Door { open: false }],
            ),
            ItemBlueprint::fixture(
                "dockingport",
                Vec2::new(0.0, 200.0),
                vec![ComponentBlueprint::DockingPort],
            ),
            ItemBlueprint::fixture(
                "junctionbox",
                Vec2::new(100.0, 0.0),
                vec![ComponentBlueprint::ConnectionPanel { wires: 4 }],
            ),
            ItemBlueprint::fixture(
                "battery",
                Vec2::new(150.0, -50.0),
                vec![ComponentBlueprint::PowerContainer {
                    charge: 500.0,
                    capacity: 1000.0,
                }],
            ),
        ];
        t.walls = vec![
            WallBlueprint {
                sections: 4,
                max_health: 100.0,
            };
            4
        ];
        t.hulls = vec![
            HullBlueprint {
                name: "cabin".into(),
            },
            HullBlueprint {
                name: "airlock".into(),
            },
        ];
        t.gaps = vec![GapBlueprint { wall: None }];
        t.waypoints = vec![
            WayPointBlueprint::human(Vec2::new(-150.0, -120.0), None, &[]),
            WayPointBlueprint::human(Vec2::new(-50.0, -120.0), None, &[]),
            WayPointBlueprint::human(Vec2::new(50.0, -120.0), None, &[]),
            WayPointBlueprint::human(Vec2::new(150.0, -120.0), None, &[]),
            WayPointBlueprint::cargo(Vec2::new(200.0, -150.0)),
        ];
        t
    }

    /// A minimal primary base whose spawn points carry the job access tags.
    pub fn outpost() -> Self {
        let mut t = Self::new("Outpost", Borders::new(3000.0, 1200.0));
        t.waypoints = vec![
            WayPointBlueprint::human(
                Vec2::new(-400.0, 0.0),
                Some("captain"),
                &["id_captain", "id_command"],
            ),
            WayPointBlueprint::human(Vec2::new(-200.0, 0.0), Some("engineer"), &["id_engineer"]),
            WayPointBlueprint::human(Vec2::new(0.0, 0.0), Some("mechanic"), &["id_mechanic"]),
            WayPointBlueprint::human(Vec2::new(200.0, 0.0), Some("medicaldoctor"), &["id_medic"]),
            WayPointBlueprint::human(
                Vec2::new(400.0, 0.0),
                Some("securityofficer"),
                &["id_security"],
            ),
            WayPointBlueprint::human(Vec2::new(600.0, 0.0), None, &["id_assistant"]),
        ];
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_content_sensitive() {
        let a = VehicleTemplate::respawn_shuttle();
        let b = VehicleTemplate::respawn_shuttle();
        assert_eq!(a.hash().unwrap(), b.hash().unwrap());
        assert_eq!(a.hash().unwrap().len(), 32);

        let mut c = b.clone();
        c.walls.pop();
        assert_ne!(a.hash().unwrap(), c.hash().unwrap());
    }

    #[test]
    fn template_round_trips_through_json() {
        let t = VehicleTemplate::respawn_shuttle();
        let json = serde_json::to_string(&t).unwrap();
        let back: VehicleTemplate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
