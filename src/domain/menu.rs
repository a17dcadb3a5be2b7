use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::MenuError;
use crate::store::Document;

/// Pricing for a menu item: one flat price, or one price per size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemPrice {
    Fixed(u32),
    BySize(BTreeMap<String, u32>),
}

/// A single dish on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: ItemPrice,
    pub available: bool,
    pub image_url: Option<String>,
}

/// A menu category document carrying its ordered list of items.
/// Plain CRUD; no lifecycle beyond that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuCategory {
    pub id: String,
    pub name: String,
    pub position: u32,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone)]
pub struct CategoryCreate {
    pub name: String,
    pub position: u32,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub position: Option<u32>,
    pub items: Option<Vec<MenuItem>>,
}

impl Document for MenuCategory {
    type Id = String;
    type CreatePayload = CategoryCreate;
    type Patch = CategoryPatch;
    type Filter = ();
    // The store sorts descending; reversing the position yields the
    // menu's display order.
    type SortKey = Reverse<u32>;
    type Error = MenuError;

    const COLLECTION: &'static str = "menu";

    fn id(&self) -> &String {
        &self.id
    }

    fn from_create(id: String, payload: CategoryCreate) -> Result<Self, MenuError> {
        if payload.name.trim().is_empty() {
            return Err(MenuError::Validation("category name is required".into()));
        }
        Ok(Self {
            id,
            name: payload.name,
            position: payload.position,
            items: payload.items,
        })
    }

    fn on_update(&mut self, patch: CategoryPatch) -> Result<(), MenuError> {
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(MenuError::Validation("category name is required".into()));
            }
            self.name = name;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(items) = patch.items {
            self.items = items;
        }
        Ok(())
    }

    fn matches(&self, _filter: &()) -> bool {
        true
    }

    fn sort_key(&self) -> Reverse<u32> {
        Reverse(self.position)
    }
}
