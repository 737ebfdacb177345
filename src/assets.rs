//! Component artwork for the rendering side.
//!
//! There is no global image table: the front end builds an [`AssetCache`]
//! once, hands `&mut` access to whatever draws, and drops or clears it on
//! teardown.

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use crate::component::{ComponentKind, Offset, PinKind, Rotation, input_offsets, output_offset};
use crate::error::{Result, WorkspaceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinGraphics {
    pub kind: PinKind,
    pub offset: Offset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentGraphics {
    pub kind: ComponentKind,
    pub svg: Vec<u8>,
    /// Pins at rotation 0, inputs first.
    pub pins: Vec<PinGraphics>,
}

pub fn asset_path(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::And => "and.svg",
        ComponentKind::Or => "or.svg",
        ComponentKind::Not => "not.svg",
        ComponentKind::Nand => "nand.svg",
        ComponentKind::Nor => "nor.svg",
        ComponentKind::Xor => "xor.svg",
        ComponentKind::Input0 => "switch-off.svg",
        ComponentKind::Input1 => "switch-on.svg",
    }
}

fn pins_of(kind: ComponentKind) -> Vec<PinGraphics> {
    input_offsets(kind, Rotation::Deg0)
        .into_iter()
        .map(|offset| PinGraphics {
            kind: PinKind::Input,
            offset,
        })
        .chain(std::iter::once(PinGraphics {
            kind: PinKind::Output,
            offset: output_offset(kind, Rotation::Deg0),
        }))
        .collect()
}

pub trait AssetLoader {
    fn load(&self, path: &str) -> std::result::Result<Vec<u8>, String>;
}

/// Reads artwork from a directory on disk.
pub struct DirLoader {
    pub root: PathBuf,
}

impl AssetLoader for DirLoader {
    fn load(&self, path: &str) -> std::result::Result<Vec<u8>, String> {
        std::fs::read(self.root.join(path)).map_err(|e| e.to_string())
    }
}

pub struct AssetCache<L: AssetLoader> {
    loader: L,
    entries: HashMap<ComponentKind, Rc<ComponentGraphics>>,
}

impl<L: AssetLoader> AssetCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            entries: HashMap::new(),
        }
    }

    /// Graphics for `kind`, loading them on first use.
    pub fn get(&mut self, kind: ComponentKind) -> Result<Rc<ComponentGraphics>> {
        if let Some(g) = self.entries.get(&kind) {
            return Ok(Rc::clone(g));
        }
        let svg = self
            .loader
            .load(asset_path(kind))
            .map_err(|e| WorkspaceError::Asset(kind, e))?;
        let graphics = Rc::new(ComponentGraphics {
            kind,
            svg,
            pins: pins_of(kind),
        });
        self.entries.insert(kind, Rc::clone(&graphics));
        log::debug!("loaded asset {}", asset_path(kind));
        Ok(graphics)
    }

    pub fn preload(&mut self) -> Result<()> {
        for kind in ComponentKind::ALL {
            self.get(kind)?;
        }
        Ok(())
    }

    pub fn is_loaded(&self, kind: ComponentKind) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
