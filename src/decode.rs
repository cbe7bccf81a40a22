//! Streaming decoder for STEP catalog XML.
//!
//! The document is read event by event through a large buffered reader, so
//! memory stays bounded by the size of a single top-level `Product` subtree
//! rather than the whole file.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::model::{AttributeGroup, AttributeValue, CrossReference, Product};
use crate::progress::ProgressObserver;

pub const READ_BUFFER_SIZE: usize = 1 << 16;

const PRODUCT: &[u8] = b"Product";
const NAME: &[u8] = b"Name";
const VALUES: &[u8] = b"Values";
const VALUE: &[u8] = b"Value";
const VALUE_GROUP: &[u8] = b"ValueGroup";
const CROSS_REFERENCE: &[u8] = b"ProductCrossReference";
const META_DATA: &[u8] = b"MetaData";

pub fn decode_catalog_file(
    path: &Path,
    observer: &mut impl ProgressObserver,
) -> Result<Vec<Product>> {
    let source_err = |source| CatalogError::SourceIo {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(source_err)?;
    let total_bytes = file.metadata().map_err(source_err)?.len();
    debug!(path = %path.display(), total_bytes, "opened catalog source");

    decode_catalog(
        BufReader::with_capacity(READ_BUFFER_SIZE, file),
        total_bytes,
        observer,
    )
}

/// Top-level products in document order. Products with an empty `ID` are
/// dropped together with their children.
pub fn decode_catalog<R: BufRead>(
    source: R,
    total_bytes: u64,
    observer: &mut impl ProgressObserver,
) -> Result<Vec<Product>> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::with_capacity(1024);
    let mut products = Vec::new();
    let mut depth = 0usize;

    loop {
        buf.clear();
        let event = next_event(&mut reader, &mut buf)?;
        observer.observe(position(&reader), total_bytes);

        match event {
            Event::Start(e) if is(&e, PRODUCT) => {
                let product = decode_product(&mut reader, &e)?;
                keep_if_identified(&mut products, product);
            }
            Event::Empty(e) if is(&e, PRODUCT) => {
                keep_if_identified(&mut products, product_header(&reader, &e)?);
            }
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    CatalogError::structure(position(&reader), "unmatched end tag")
                })?;
            }
            Event::Eof => {
                if depth > 0 {
                    return Err(unexpected_eof(&reader, "document"));
                }
                break;
            }
            _ => {}
        }
    }

    debug!(products = products.len(), "decoded top-level products");
    Ok(products)
}

fn keep_if_identified(products: &mut Vec<Product>, product: Product) {
    if product.id.is_empty() {
        debug!(name = %product.name, "dropping product without ID");
        return;
    }
    products.push(product);
}

fn decode_product<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Product> {
    let mut product = product_header(reader, start)?;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match next_event(reader, &mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                PRODUCT => product.children.push(decode_product(reader, &e)?),
                NAME => product.name = read_char_data(reader)?,
                VALUES => decode_values(reader, &mut product)?,
                CROSS_REFERENCE => product
                    .cross_references
                    .push(decode_cross_reference(reader, &e)?),
                _ => skip_element(reader, &e)?,
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                PRODUCT => product.children.push(product_header(reader, &e)?),
                NAME => product.name.clear(),
                CROSS_REFERENCE => product
                    .cross_references
                    .push(cross_reference_header(reader, &e)?),
                _ => {}
            },
            Event::End(_) => return Ok(product),
            Event::Eof => return Err(unexpected_eof(reader, "Product")),
            _ => {}
        }
    }
}

fn product_header<R>(reader: &Reader<R>, start: &BytesStart) -> Result<Product> {
    Ok(Product::new(attribute(reader, start, b"ID")?))
}

fn decode_values<R: BufRead>(reader: &mut Reader<R>, product: &mut Product) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match next_event(reader, &mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                VALUE => {
                    let attribute_id = attribute(reader, &e, b"AttributeID")?;
                    let text = read_inner_xml(reader)?;
                    product.values.push(AttributeValue { attribute_id, text });
                }
                VALUE_GROUP => {
                    let mut group = AttributeGroup {
                        attribute_id: attribute(reader, &e, b"AttributeID")?,
                        values: Vec::new(),
                    };
                    decode_value_list(reader, &mut group.values)?;
                    product.value_groups.push(group);
                }
                _ => skip_element(reader, &e)?,
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                VALUE => product.values.push(AttributeValue {
                    attribute_id: attribute(reader, &e, b"AttributeID")?,
                    text: String::new(),
                }),
                VALUE_GROUP => product.value_groups.push(AttributeGroup {
                    attribute_id: attribute(reader, &e, b"AttributeID")?,
                    values: Vec::new(),
                }),
                _ => {}
            },
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(unexpected_eof(reader, "Values")),
            _ => {}
        }
    }
}

fn decode_cross_reference<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
) -> Result<CrossReference> {
    let mut reference = cross_reference_header(reader, start)?;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match next_event(reader, &mut buf)? {
            Event::Start(e) if is(&e, META_DATA) => {
                decode_value_list(reader, &mut reference.values)?
            }
            Event::Start(e) => skip_element(reader, &e)?,
            Event::End(_) => return Ok(reference),
            Event::Eof => return Err(unexpected_eof(reader, "ProductCrossReference")),
            _ => {}
        }
    }
}

fn cross_reference_header<R>(reader: &Reader<R>, start: &BytesStart) -> Result<CrossReference> {
    Ok(CrossReference {
        id: attribute(reader, start, b"ProductID")?,
        kind: attribute(reader, start, b"Type")?,
        values: Vec::new(),
    })
}

fn decode_value_list<R: BufRead>(
    reader: &mut Reader<R>,
    values: &mut Vec<AttributeValue>,
) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match next_event(reader, &mut buf)? {
            Event::Start(e) if is(&e, VALUE) => {
                let attribute_id = attribute(reader, &e, b"AttributeID")?;
                let text = read_inner_xml(reader)?;
                values.push(AttributeValue { attribute_id, text });
            }
            Event::Start(e) => skip_element(reader, &e)?,
            Event::Empty(e) if is(&e, VALUE) => values.push(AttributeValue {
                attribute_id: attribute(reader, &e, b"AttributeID")?,
                text: String::new(),
            }),
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(unexpected_eof(reader, "Value list")),
            _ => {}
        }
    }
}

// Raw content up to the end tag, markup included.
fn read_inner_xml<R: BufRead>(reader: &mut Reader<R>) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        buf.clear();
        let event = next_event(reader, &mut buf)?;
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(unexpected_eof(reader, "Value")),
            _ => {}
        }
        writer
            .write_event(event)
            .map_err(|e| CatalogError::structure(position(reader), e.to_string()))?;
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| CatalogError::structure(position(reader), e.to_string()))
}

fn read_char_data<R: BufRead>(reader: &mut Reader<R>) -> Result<String> {
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match next_event(reader, &mut buf)? {
            Event::Text(t) => text.push_str(&t.decode().map_err(|e| encoding(reader, e))?),
            Event::CData(c) => text.push_str(&c.decode().map_err(|e| encoding(reader, e))?),
            Event::GeneralRef(r) => text.push_str(&resolve_reference(reader, &r)?),
            Event::Start(e) => skip_element(reader, &e)?,
            Event::End(_) => return Ok(text),
            Event::Eof => return Err(unexpected_eof(reader, "Name")),
            _ => {}
        }
    }
}

fn resolve_reference<R>(reader: &Reader<R>, reference: &BytesRef) -> Result<String> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|e| encoding(reader, e))?
    {
        return Ok(ch.to_string());
    }

    let name = reference.decode().map_err(|e| encoding(reader, e))?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| {
            CatalogError::structure(position(reader), format!("unknown entity &{name};"))
        })
}

fn skip_element<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<()> {
    let mut buf = Vec::new();
    reader
        .read_to_end_into(start.name(), &mut buf)
        .map_err(|source| CatalogError::Xml {
            position: position(reader),
            source,
        })?;
    Ok(())
}

fn attribute<R>(reader: &Reader<R>, start: &BytesStart, local_name: &[u8]) -> Result<String> {
    for attr in start.attributes() {
        let attr = attr.map_err(|e| CatalogError::Xml {
            position: position(reader),
            source: e.into(),
        })?;
        if attr.key.local_name().as_ref() == local_name {
            let value = attr
                .unescape_value()
                .map_err(|e| encoding(reader, e))?;
            return Ok(value.into_owned());
        }
    }
    Ok(String::new())
}

fn next_event<'b, R: BufRead>(reader: &mut Reader<R>, buf: &'b mut Vec<u8>) -> Result<Event<'b>> {
    reader
        .read_event_into(buf)
        .map_err(|source| CatalogError::Xml {
            position: reader.error_position() as u64,
            source,
        })
}

fn is(start: &BytesStart, local_name: &[u8]) -> bool {
    start.local_name().as_ref() == local_name
}

fn position<R>(reader: &Reader<R>) -> u64 {
    reader.buffer_position() as u64
}

fn encoding<R>(reader: &Reader<R>, err: impl ToString) -> CatalogError {
    CatalogError::structure(position(reader), err.to_string())
}

fn unexpected_eof<R>(reader: &Reader<R>, inside: &str) -> CatalogError {
    CatalogError::structure(
        position(reader),
        format!("unexpected end of input inside {inside}"),
    )
}
