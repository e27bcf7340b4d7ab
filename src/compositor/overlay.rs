//! Overlay content streams

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::types::OverlayRect;

/// Opaque black, in DeviceRGB
pub const FILL_RGB: [f32; 3] = [0.0, 0.0, 0.0];

fn real(value: f64) -> Object {
    Object::Real((value as f32).into())
}

/// `q <fill> rg x y w h re f ... Q`, one rectangle per overlay
pub fn overlay_operations(rects: &[OverlayRect]) -> Vec<Operation> {
    let mut operations = Vec::with_capacity(rects.len() + 3);
    operations.push(Operation::new("q", vec![]));
    operations.push(Operation::new(
        "rg",
        FILL_RGB.iter().map(|c| real(*c as f64)).collect(),
    ));
    for rect in rects {
        operations.push(Operation::new(
            "re",
            vec![real(rect.x), real(rect.y), real(rect.width), real(rect.height)],
        ));
        operations.push(Operation::new("f", vec![]));
    }
    operations.push(Operation::new("Q", vec![]));
    operations
}

pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn flate_stream(data: &[u8]) -> Result<Stream> {
    Ok(Stream::new(dictionary! { "Filter" => "FlateDecode" }, compress(data)?))
}

/// Appends the overlay to a page's `/Contents`.
///
/// The existing content is bracketed by `q`/`Q` so state it leaves behind
/// cannot move or recolour the overlay.
pub fn append_overlay(document: &mut lopdf::Document, page_id: ObjectId, rects: &[OverlayRect]) -> Result<()> {
    let existing: Vec<Object> = {
        let page = document
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(Error::parse)?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match document.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let overlay = Content {
        operations: overlay_operations(rects),
    }
    .encode()
    .map_err(Error::write)?;

    let open_id = document.add_object(flate_stream(b"q\n")?);
    let close_id = document.add_object(flate_stream(b"\nQ\n")?);
    let overlay_id = document.add_object(flate_stream(&overlay)?);

    let mut contents = Vec::with_capacity(existing.len() + 3);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(close_id));
    contents.push(Object::Reference(overlay_id));

    document
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(Error::parse)?
        .set("Contents", Object::Array(contents));
    Ok(())
}
