//! Block-level contract sketch builder.
//! A much finer-grained companion to the module merge engine: single code
//! blocks are dropped into fixed zones of an in-memory sketch, validated
//! with a simplified single-slot rule set, and rendered to Solidity by
//! positional concatenation. There are no injection modes here.

use thiserror::Error as ThisError;

/// The fixed zones a block may be placed in, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    #[default]
    Imports,
    State,
    Constructor,
    FunctionBody,
}

impl Zone {
    pub fn label(&self) -> &'static str {
        match self {
            Zone::Imports => "imports",
            Zone::State => "state",
            Zone::Constructor => "constructor",
            Zone::FunctionBody => "function-body",
        }
    }
}

/// A single draggable code block.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub id: String,
    pub name: String,
    /// The zone this block belongs to
    pub zone: Zone,
    /// Solidity text appended verbatim when rendering
    pub template: String,
    /// Block ids that must be present on the sketch; `prefix-*` wildcards
    /// are allowed
    pub requires: Vec<String>,
    /// Block ids that may not share the sketch; wildcards allowed
    pub incompatible_with: Vec<String>,
    /// Ids of blocks that must appear earlier on the sketch
    pub after: Vec<String>,
    /// Ids of blocks that must appear later on the sketch
    pub before: Vec<String>,
    /// Encrypted type this block declares (e.g. a state block declaring
    /// `euint64`)
    pub declares_type: Option<String>,
    /// Pattern an earlier-declared encrypted type must match for this
    /// block to be usable (e.g. `euint*`)
    pub type_pattern: Option<String>,
}

/// A rule violated by the current sketch.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum BlockViolation {
    #[error("block '{block}' belongs in the {expected} zone, not {placed}")]
    WrongZone { block: String, expected: String, placed: String },

    #[error("block '{block}' requires '{requirement}', which is not on the sketch")]
    MissingRequirement { block: String, requirement: String },

    #[error("block '{block}' is incompatible with '{other}'")]
    Incompatible { block: String, other: String },

    #[error("block '{block}' must come after '{other}'")]
    MustFollow { block: String, other: String },

    #[error("block '{block}' must come before '{other}'")]
    MustPrecede { block: String, other: String },

    #[error("block '{block}' needs an encrypted type matching '{pattern}', but none is declared")]
    TypePatternUnmatched { block: String, pattern: String },
}

/// Explicit prefix-match predicate for block id patterns. A trailing `*`
/// matches any id with the preceding prefix; anything else is an exact
/// match. Evaluated freshly per query; the id universe is small and
/// static per request.
pub fn matches_pattern(pattern: &str, id: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => id.starts_with(prefix),
        None => pattern == id,
    }
}

/// An in-memory contract sketch: an ordered list of placed blocks.
#[derive(Debug, Default)]
pub struct Sketch {
    name: String,
    placed: Vec<(Zone, Block)>,
}

impl Sketch {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into(), placed: Vec::new() }
    }

    /// Drops a block into a zone. Placement is never rejected here; a
    /// mismatched zone surfaces through `validate`.
    pub fn place(&mut self, zone: Zone, block: Block) {
        self.placed.push((zone, block));
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.placed.iter().map(|(_, block)| block)
    }

    /// Checks the whole sketch: zone compatibility, requires and
    /// incompatibilities (with wildcard expansion), before/after ordering
    /// constraints, and type-pattern matching against types declared by
    /// earlier blocks.
    pub fn validate(&self) -> Vec<BlockViolation> {
        let mut violations = Vec::new();
        let ids: Vec<&str> = self.placed.iter().map(|(_, b)| b.id.as_str()).collect();

        for (index, (zone, block)) in self.placed.iter().enumerate() {
            if *zone != block.zone {
                violations.push(BlockViolation::WrongZone {
                    block: block.id.clone(),
                    expected: block.zone.label().to_string(),
                    placed: zone.label().to_string(),
                });
            }

            for requirement in &block.requires {
                let present = ids
                    .iter()
                    .any(|id| *id != block.id && matches_pattern(requirement, id));
                if !present {
                    violations.push(BlockViolation::MissingRequirement {
                        block: block.id.clone(),
                        requirement: requirement.clone(),
                    });
                }
            }

            for exclusion in &block.incompatible_with {
                for id in &ids {
                    if *id != block.id && matches_pattern(exclusion, id) {
                        violations.push(BlockViolation::Incompatible {
                            block: block.id.clone(),
                            other: id.to_string(),
                        });
                    }
                }
            }

            for other in &block.after {
                let misordered = self
                    .placed
                    .iter()
                    .enumerate()
                    .any(|(i, (_, b))| b.id == *other && i > index);
                if misordered {
                    violations.push(BlockViolation::MustFollow {
                        block: block.id.clone(),
                        other: other.clone(),
                    });
                }
            }

            for other in &block.before {
                let misordered = self
                    .placed
                    .iter()
                    .enumerate()
                    .any(|(i, (_, b))| b.id == *other && i < index);
                if misordered {
                    violations.push(BlockViolation::MustPrecede {
                        block: block.id.clone(),
                        other: other.clone(),
                    });
                }
            }

            if let Some(pattern) = &block.type_pattern {
                let matched = self.placed[..index].iter().any(|(_, b)| {
                    b.declares_type
                        .as_deref()
                        .map(|declared| matches_pattern(pattern, declared))
                        .unwrap_or(false)
                });
                if !matched {
                    violations.push(BlockViolation::TypePatternUnmatched {
                        block: block.id.clone(),
                        pattern: pattern.clone(),
                    });
                }
            }
        }

        violations
    }

    /// Renders the sketch to Solidity: zones in fixed order, blocks within
    /// a zone in placement order, each template appended positionally.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("// SPDX-License-Identifier: MIT\n");
        out.push_str("pragma solidity ^0.8.24;\n\n");

        for (_, block) in self.in_zone(Zone::Imports) {
            out.push_str(block.template.trim_end());
            out.push('\n');
        }

        out.push_str(&format!("\ncontract {} {{\n", self.name));

        for (_, block) in self.in_zone(Zone::State) {
            push_indented(&mut out, &block.template, "    ");
        }

        let has_constructor = self.in_zone(Zone::Constructor).next().is_some();
        if has_constructor {
            out.push_str("\n    constructor() {\n");
            for (_, block) in self.in_zone(Zone::Constructor) {
                push_indented(&mut out, &block.template, "        ");
            }
            out.push_str("    }\n");
        }

        for (_, block) in self.in_zone(Zone::FunctionBody) {
            out.push('\n');
            push_indented(&mut out, &block.template, "    ");
        }

        out.push_str("}\n");
        out
    }

    fn in_zone(&self, zone: Zone) -> impl Iterator<Item = &(Zone, Block)> {
        self.placed.iter().filter(move |(z, _)| *z == zone)
    }
}

fn push_indented(out: &mut String, template: &str, indent: &str) {
    for line in template.trim_end().lines() {
        if line.is_empty() {
            out.push('\n');
        } else {
            out.push_str(indent);
            out.push_str(line);
            out.push('\n');
        }
    }
}
