//! Built-in demo creatures
//!
//! Each preset is assembled through [`BlueprintBuilder`] exactly like a
//! hand-drawn design, so rest lengths come from the node layout.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use sinew_creature::{Blueprint, BlueprintBuilder};

/// Named starter blueprints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Preset {
    /// Two feet under an arch; muscles span the base and the top
    Inchworm,
    /// Box with four muscles and a bracing bone
    #[default]
    Quad,
    /// Rigid torso on two muscular legs
    Walker,
    /// Smallest useful design: one muscle, two bones
    Triangle,
}

struct Layout {
    nodes: &'static [(f32, f32)],
    muscles: &'static [(usize, usize)],
    bones: &'static [(usize, usize)],
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Inchworm,
        Preset::Quad,
        Preset::Walker,
        Preset::Triangle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Inchworm => "inchworm",
            Preset::Quad => "quad",
            Preset::Walker => "walker",
            Preset::Triangle => "triangle",
        }
    }

    fn layout(&self) -> Layout {
        match self {
            Preset::Inchworm => Layout {
                nodes: &[(-90.0, 40.0), (-30.0, -10.0), (30.0, -10.0), (90.0, 40.0)],
                muscles: &[(0, 3), (1, 2)],
                bones: &[(0, 1), (2, 3)],
            },
            Preset::Quad => Layout {
                nodes: &[(-60.0, 30.0), (60.0, 30.0), (60.0, -30.0), (-60.0, -30.0)],
                muscles: &[(0, 1), (1, 2), (2, 3), (3, 0)],
                bones: &[(0, 2)],
            },
            Preset::Walker => Layout {
                nodes: &[
                    (-50.0, -40.0),
                    (50.0, -40.0),
                    (0.0, -70.0),
                    (-80.0, 50.0),
                    (80.0, 50.0),
                    (0.0, 10.0),
                ],
                muscles: &[(0, 3), (1, 4), (5, 3), (5, 4), (0, 5), (1, 5)],
                bones: &[(0, 1), (1, 2), (2, 0)],
            },
            Preset::Triangle => Layout {
                nodes: &[(-50.0, 40.0), (50.0, 40.0), (0.0, -40.0)],
                muscles: &[(0, 1)],
                bones: &[(1, 2), (2, 0)],
            },
        }
    }

    /// Build this preset's blueprint
    pub fn blueprint(&self) -> Result<Blueprint> {
        let layout = self.layout();
        let mut builder = BlueprintBuilder::new();
        for &(x, y) in layout.nodes {
            builder.add_node(x, y)?;
        }
        for &(a, b) in layout.muscles {
            builder.add_muscle(a, b)?;
        }
        for &(a, b) in layout.bones {
            builder.add_bone(a, b)?;
        }
        builder
            .build()
            .with_context(|| format!("Preset '{}' is not a valid blueprint", self.name()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = Preset::ALL.iter().map(|p| p.name()).collect();
                format!("Unknown preset '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}
