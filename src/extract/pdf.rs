//! Concrete [`DocumentSource`] backed by `lopdf`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::{OutlineNode, PageRef};

use super::source::DocumentSource;

/// A PDF document opened through `lopdf`.
pub struct LopdfSource {
    doc: LopdfDocument,
    /// Page number (1-based) keyed by page object id.
    page_ids: HashMap<ObjectId, u32>,
    pages: BTreeMap<u32, ObjectId>,
}

impl LopdfSource {
    /// Load from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let name = path.as_ref().display().to_string();
        let doc = LopdfDocument::load(path.as_ref()).map_err(|e| Error::extraction(&name, e))?;
        Ok(Self::from_document(doc))
    }

    /// Load from an in-memory byte slice.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data).map_err(|e| Error::extraction("<memory>", e))?;
        Ok(Self::from_document(doc))
    }

    fn from_document(doc: LopdfDocument) -> Self {
        let pages = doc.get_pages();
        let page_ids = pages.iter().map(|(num, id)| (*id, *num)).collect();
        Self {
            doc,
            page_ids,
            pages,
        }
    }

    /// Walk a chain of sibling outline items into nodes.
    ///
    /// A PDF outline item with children contributes a `Leaf` followed by
    /// a `Branch` holding the child chain, so children sit one depth
    /// level below their parent in the traversal.
    fn outline_chain(&self, first: ObjectId, seen: &mut HashSet<ObjectId>) -> Vec<OutlineNode> {
        let mut nodes = Vec::new();
        let mut current = Some(first);

        while let Some(id) = current {
            // Guard against malformed trees with sibling cycles.
            if !seen.insert(id) {
                break;
            }
            let Ok(dict) = self.doc.get_dictionary(id) else {
                break;
            };

            let title = dict
                .get(b"Title")
                .ok()
                .and_then(|obj| self.resolve_string(obj))
                .unwrap_or_default();
            nodes.push(OutlineNode::Leaf {
                title,
                page: self.item_page_ref(dict),
            });

            if let Ok(child) = dict.get(b"First").and_then(Object::as_reference) {
                nodes.push(OutlineNode::Branch(self.outline_chain(child, seen)));
            }

            current = dict.get(b"Next").and_then(Object::as_reference).ok();
        }

        nodes
    }

    /// Extract an item's page target from its `Dest` or `A`/`D` entry.
    fn item_page_ref(&self, item: &Dictionary) -> PageRef {
        let dest = item.get(b"Dest").ok().or_else(|| {
            item.get(b"A")
                .ok()
                .and_then(|a| self.deref(a).as_dict().ok())
                .and_then(|action| action.get(b"D").ok())
        });

        match dest.map(|d| self.deref(d)) {
            Some(Object::Array(arr)) => match arr.first() {
                Some(Object::Reference(page_id)) => self
                    .page_ids
                    .get(page_id)
                    .map(|n| PageRef::Physical(*n))
                    .unwrap_or_else(|| PageRef::Indirect(format!("{} {}", page_id.0, page_id.1))),
                Some(Object::Integer(i)) => PageRef::Physical(*i as u32 + 1),
                _ => PageRef::Indirect(String::new()),
            },
            Some(Object::Name(name)) => PageRef::Indirect(String::from_utf8_lossy(name).to_string()),
            Some(Object::String(bytes, _)) => PageRef::Indirect(decode_pdf_string(bytes)),
            _ => PageRef::Indirect(String::new()),
        }
    }

    /// Follow a reference one level, returning the object itself otherwise.
    fn deref<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    fn resolve_string(&self, obj: &Object) -> Option<String> {
        match self.deref(obj) {
            Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
            _ => None,
        }
    }
}

impl DocumentSource for LopdfSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, page_number: u32) -> Result<Option<String>> {
        match self.doc.extract_text(&[page_number]) {
            Ok(text) if text.trim().is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                // A page that cannot be extracted is skipped, not fatal.
                log::debug!("No text extracted from page {page_number}: {e}");
                Ok(None)
            }
        }
    }

    fn outline(&self) -> Result<Option<OutlineNode>> {
        let catalog = self
            .doc
            .catalog()
            .map_err(|e| Error::extraction("<catalog>", e))?;

        let Ok(outlines) = catalog
            .get(b"Outlines")
            .and_then(Object::as_reference)
            .and_then(|id| self.doc.get_dictionary(id))
        else {
            return Ok(None);
        };

        let Ok(first) = outlines.get(b"First").and_then(Object::as_reference) else {
            return Ok(None);
        };

        let mut seen = HashSet::new();
        let items = self.outline_chain(first, &mut seen);
        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(OutlineNode::Branch(items)))
        }
    }

    fn resolve_page(&self, reference: &str) -> Result<u32> {
        let catalog = self
            .doc
            .catalog()
            .map_err(|e| Error::extraction("<catalog>", e))?;

        // PDF 1.1 style named destinations under /Dests.
        let dests = catalog
            .get(b"Dests")
            .map(|d| self.deref(d))
            .ok()
            .and_then(|d| d.as_dict().ok())
            .ok_or_else(|| Error::extraction(reference, "no destination dictionary"))?;

        let dest = dests
            .get(reference.as_bytes())
            .map(|d| self.deref(d))
            .map_err(|e| Error::extraction(reference, e))?;

        if let Object::Array(arr) = dest {
            if let Some(Object::Reference(page_id)) = arr.first() {
                if let Some(page) = self.page_ids.get(page_id) {
                    return Ok(*page);
                }
            }
        }
        Err(Error::extraction(reference, "unresolvable destination"))
    }
}

/// Decode a PDF string: UTF-16BE with BOM, then UTF-8, then Latin-1.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pdf_string_utf8() {
        assert_eq!(decode_pdf_string(b"EVALUACI\xC3\x93N"), "EVALUACIÓN");
    }

    #[test]
    fn test_decode_pdf_string_utf16be() {
        // UTF-16BE BOM + "Hi"
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&bytes), "Hi");
    }

    #[test]
    fn test_decode_pdf_string_latin1() {
        // 0xD3 = 'Ó' in Latin-1
        let bytes = [0x4C, 0x49, 0x43, 0x49, 0x54, 0x41, 0x43, 0x49, 0xD3, 0x4E];
        assert_eq!(decode_pdf_string(&bytes), "LICITACIÓN");
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(LopdfSource::from_bytes(b"not a pdf").is_err());
    }
}
