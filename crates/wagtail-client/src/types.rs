//! Response types for the content API.
//!
//! Items are decoded against the family they were requested from, so the
//! `meta` union is chosen by the request rather than by probing fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content::ContentFamily;

// ─────────────────────────────────────────────────────────────────────────────
// Meta
// ─────────────────────────────────────────────────────────────────────────────

/// Meta block of a page item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Model name, e.g. `blog.BlogPage`. Empty when trimmed by `fields`.
    #[serde(rename = "type", default)]
    pub page_type: String,
    /// Slug.
    #[serde(default)]
    pub slug: String,
    /// Locale code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// API detail URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
    /// Public URL of the rendered page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    /// Whether the page appears in menus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_in_menus: Option<bool>,
    /// SEO title override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<String>,
    /// SEO description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_description: Option<String>,
    /// First publication time (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_published_at: Option<String>,
    /// Any other meta fields the server sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Meta block of an image or document item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMeta {
    /// Model name, e.g. `wagtailimages.Image`. Empty when trimmed by `fields`.
    #[serde(rename = "type", default)]
    pub media_type: String,
    /// API detail URL.
    #[serde(default)]
    pub detail_url: String,
    /// File URL. Relative for images, absolute for documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Any other meta fields the server sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Meta block, selected by the family of the request.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentMeta {
    /// Page meta.
    Page(PageMeta),
    /// Image or document meta.
    Media(MediaMeta),
}

// ─────────────────────────────────────────────────────────────────────────────
// Items
// ─────────────────────────────────────────────────────────────────────────────

/// A single page, image, or document.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    /// Item ID.
    pub id: u64,
    /// Title.
    pub title: String,
    /// Family the item was fetched from.
    pub family: ContentFamily,
    /// Meta block.
    pub meta: ContentMeta,
    /// Every other top-level field (body, custom page fields, ...).
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawItem {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    meta: Value,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ContentItem {
    /// Decode an item fetched from `family`.
    pub fn from_value(family: ContentFamily, value: Value) -> serde_json::Result<Self> {
        let raw: RawItem = serde_json::from_value(value)?;
        // `fields` can drop the whole meta block.
        let meta_value = match raw.meta {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        let meta = match family {
            ContentFamily::Pages => ContentMeta::Page(serde_json::from_value(meta_value)?),
            ContentFamily::Images | ContentFamily::Documents => {
                ContentMeta::Media(serde_json::from_value(meta_value)?)
            }
        };
        Ok(Self {
            id: raw.id,
            title: raw.title,
            family,
            meta,
            extra: raw.extra,
        })
    }

    /// Page meta, if this is a page.
    pub fn page_meta(&self) -> Option<&PageMeta> {
        match &self.meta {
            ContentMeta::Page(meta) => Some(meta),
            ContentMeta::Media(_) => None,
        }
    }

    /// Media meta, if this is an image or document.
    pub fn media_meta(&self) -> Option<&MediaMeta> {
        match &self.meta {
            ContentMeta::Media(meta) => Some(meta),
            ContentMeta::Page(_) => None,
        }
    }

    /// A field outside the known set.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lists
// ─────────────────────────────────────────────────────────────────────────────

/// Meta block of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    /// Number of matching items across all pages of the listing.
    pub total_count: u64,
}

/// A listing response.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentList {
    /// Listing meta.
    pub meta: ListMeta,
    /// Items in server order.
    pub items: Vec<ContentItem>,
}

#[derive(Deserialize)]
struct RawList {
    meta: ListMeta,
    items: Vec<Value>,
}

impl ContentList {
    /// Decode a listing fetched from `family`.
    pub fn from_value(family: ContentFamily, value: Value) -> serde_json::Result<Self> {
        let raw: RawList = serde_json::from_value(value)?;
        let items = raw
            .items
            .into_iter()
            .map(|item| ContentItem::from_value(family, item))
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(Self {
            meta: raw.meta,
            items,
        })
    }

    /// Total matching items on the server.
    pub fn total_count(&self) -> u64 {
        self.meta.total_count
    }

    /// Whether this page of the listing has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First item, if any.
    pub fn first(&self) -> Option<&ContentItem> {
        self.items.first()
    }
}

/// Result of a content fetch: a listing for a collection path, an item for
/// a single-resource path.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentResponse {
    /// Collection result.
    List(ContentList),
    /// Single-resource result.
    Item(ContentItem),
}

impl ContentResponse {
    /// The listing, if this is one.
    pub fn into_list(self) -> Option<ContentList> {
        match self {
            ContentResponse::List(list) => Some(list),
            ContentResponse::Item(_) => None,
        }
    }

    /// The item, if this is one.
    pub fn into_item(self) -> Option<ContentItem> {
        match self {
            ContentResponse::Item(item) => Some(item),
            ContentResponse::List(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_item_decodes_page_meta() {
        let value = json!({
            "id": 3,
            "title": "Home",
            "meta": {
                "type": "home.HomePage",
                "slug": "home",
                "locale": "en",
                "html_url": "http://localhost/",
                "seo_title": "Welcome",
                "parent": null
            },
            "body": "<p>Hello</p>"
        });

        let item = ContentItem::from_value(ContentFamily::Pages, value).unwrap();
        let meta = item.page_meta().unwrap();
        assert_eq!(item.id, 3);
        assert_eq!(meta.page_type, "home.HomePage");
        assert_eq!(meta.slug, "home");
        assert_eq!(meta.seo_title.as_deref(), Some("Welcome"));
        assert!(meta.extra.contains_key("parent"));
        assert_eq!(item.field("body"), Some(&json!("<p>Hello</p>")));
        assert!(item.media_meta().is_none());
    }

    #[test]
    fn test_image_item_decodes_media_meta() {
        let value = json!({
            "id": 1,
            "title": "Logo",
            "meta": {
                "type": "wagtailimages.Image",
                "detail_url": "http://localhost/api/v2/images/1/",
                "download_url": "/media/original_images/logo.png",
                "tags": ["brand"]
            },
            "width": 640
        });

        let item = ContentItem::from_value(ContentFamily::Images, value).unwrap();
        let meta = item.media_meta().unwrap();
        assert_eq!(meta.media_type, "wagtailimages.Image");
        assert_eq!(meta.tags, vec!["brand".to_string()]);
        assert_eq!(item.field("width"), Some(&json!(640)));
    }

    #[test]
    fn test_family_decides_meta_shape() {
        let value = json!({
            "id": 1,
            "title": "x",
            "meta": { "type": "home.HomePage", "slug": "x" }
        });
        let item = ContentItem::from_value(ContentFamily::Documents, value).unwrap();
        let meta = item.media_meta().unwrap();
        assert_eq!(meta.media_type, "home.HomePage");
        assert_eq!(meta.detail_url, "");
        assert_eq!(meta.extra.get("slug"), Some(&json!("x")));
        assert!(item.page_meta().is_none());
    }

    #[test]
    fn test_trimmed_fields_still_decode() {
        // fields=_,title
        let bare = json!({ "id": 1, "title": "Blog" });
        let item = ContentItem::from_value(ContentFamily::Pages, bare).unwrap();
        assert_eq!(item.title, "Blog");
        assert_eq!(item.page_meta().unwrap().page_type, "");

        // fields=-type
        let untyped = json!({ "id": 4, "title": "About", "meta": { "slug": "about" } });
        let item = ContentItem::from_value(ContentFamily::Pages, untyped).unwrap();
        assert_eq!(item.page_meta().unwrap().slug, "about");

        let image = json!({ "id": 7, "meta": null });
        let item = ContentItem::from_value(ContentFamily::Images, image).unwrap();
        assert_eq!(item.media_meta().unwrap().download_url, None);
    }

    #[test]
    fn test_item_without_id_is_rejected() {
        let value = json!({ "title": "no id", "meta": {} });
        assert!(ContentItem::from_value(ContentFamily::Pages, value).is_err());
    }

    #[test]
    fn test_list_decodes_items() {
        let value = json!({
            "meta": { "total_count": 12 },
            "items": [
                { "id": 1, "title": "A", "meta": { "type": "home.HomePage", "slug": "a" } },
                { "id": 2, "title": "B", "meta": { "type": "home.HomePage", "slug": "b" } }
            ]
        });

        let list = ContentList::from_value(ContentFamily::Pages, value).unwrap();
        assert_eq!(list.total_count(), 12);
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.first().map(|i| i.id), Some(1));
    }
}
