//! Static catalog of furnishings that can be placed in a room.

/// A selectable catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: &'static str,
    pub name: &'static str,
}

/// An ordered group of catalog entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemCategory {
    pub name: &'static str,
    pub items: &'static [CatalogItem],
}

const fn item(id: &'static str, name: &'static str) -> CatalogItem {
    CatalogItem { id, name }
}

pub static ITEM_CATEGORIES: &[ItemCategory] = &[
    ItemCategory {
        name: "Furniture",
        items: &[
            item("sofa", "Sofa"),
            item("cabinet", "Cabinet"),
            item("table", "Table"),
            item("chair", "Chair"),
            item("bed", "Bed"),
            item("bookshelf", "Bookshelf"),
            item("coffee-table", "Coffee Table"),
            item("rug", "Rug"),
        ],
    },
    ItemCategory {
        name: "Appliances",
        items: &[
            item("refrigerator", "Refrigerator"),
            item("tv", "Television"),
            item("washing-machine", "Washing Machine"),
            item("air-conditioner", "Air Conditioner"),
            item("floor-lamp", "Floor Lamp"),
            item("microwave", "Microwave"),
        ],
    },
];

/// Looks up a catalog entry by id.
pub fn find_item(id: &str) -> Option<&'static CatalogItem> {
    ITEM_CATEGORIES
        .iter()
        .flat_map(|category| category.items.iter())
        .find(|item| item.id == id)
}
