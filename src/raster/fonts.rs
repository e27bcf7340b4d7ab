//! Preview font lookup

use ab_glyph::FontVec;
use fontdb::{Database, Family, Query, ID};
use tracing::{debug, warn};

/// Families tried in order before the database's default sans-serif face
pub const FONT_CANDIDATES: [&str; 5] = ["Microsoft YaHei", "SimSun", "SimHei", "KaiTi", "Arial"];

/// First loadable system face among the candidates, then any default face
pub fn load_preview_font() -> Option<FontVec> {
    let mut database = Database::new();
    database.load_system_fonts();
    debug!("Font database holds {} faces", database.len());

    let named = FONT_CANDIDATES.iter().find_map(|family| {
        let families = [Family::Name(*family)];
        let id = database.query(&Query {
            families: &families,
            ..Query::default()
        })?;
        load_face(&database, id).map(|font| {
            debug!("Preview font: {}", family);
            font
        })
    });
    if named.is_some() {
        return named;
    }

    let generic = database
        .query(&Query {
            families: &[Family::SansSerif],
            ..Query::default()
        })
        .or_else(|| database.faces().next().map(|face| face.id));

    match generic.and_then(|id| load_face(&database, id)) {
        Some(font) => Some(font),
        None => {
            warn!("No usable system font, previews show text as blocks");
            None
        }
    }
}

fn load_face(database: &Database, id: ID) -> Option<FontVec> {
    database
        .with_face_data(id, |data, index| FontVec::try_from_vec_and_index(data.to_vec(), index).ok())
        .flatten()
}
