//! Lexical classification rules
//!
//! Patterns run over [`normalize`]d text, so they are written lower-case and
//! without accents. Evaluation order matters: the first matching rule wins.

use once_cell::sync::Lazy;
use regex::Regex;

use super::QueryClassification;
use crate::domain::error::RetrievalError;
use crate::domain::text::{char_len, normalize, word_count};

/// Upper bound on query length, in characters
pub const MAX_QUERY_CHARS: usize = 4000;

/// A greeting only counts when it is the whole message
const MAX_GREETING_WORDS: usize = 4;

static GREETING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(hola+|buenas|buen dia|buenos dias|buenas tardes|buenas noches|hey|saludos|que tal)( (que tal|como estas|como esta|a todos|amigo|amiga|bot))*$",
    )
    .expect("valid greeting regex")
});

static RULES: Lazy<Vec<(QueryClassification, Regex)>> = Lazy::new(|| {
    let table = [
        (
            QueryClassification::IdentityMeta,
            r"\b(que|quien) eres\b|\bque (haces|puedes hacer)\b|\bque modelo\b|\bcomo funcionas\b|\beres (un |una )?(bot|robot|humano|persona|ia)\b|\bcon quien hablo\b",
        ),
        (
            QueryClassification::Enumeration,
            r"\b(cuales|lista|listar|listado|enumera|cuantas|todas las|todos los|oferta academica)\b|\bque (carreras|licenciaturas|ingenierias|programas)\b",
        ),
        (
            QueryClassification::Admission,
            r"inscri|admisi|requisito|documento|como (entrar|ingreso|ingresar)|postula|prueba de ingreso",
        ),
        (
            QueryClassification::Curriculum,
            r"semestre|trimestre|materia|asignatura|pensum|malla|curricul|que veo en|cuanto dura|duracion",
        ),
        (
            QueryClassification::Location,
            r"donde|ubicaci|direcci|como llego|localiza|\bqueda\b|\bsede\b|campus",
        ),
        (
            QueryClassification::Cost,
            r"cuanto|costo|cuesta|precio|beca|gratis|gratuit|\bpagos?\b|arancel|financiamiento|mensualidad",
        ),
        (
            QueryClassification::Schedule,
            r"horario|\bcuando\b|fecha|\babre|\bcierra|\bdias\b|\bhoras?\b|calendario",
        ),
        (
            QueryClassification::Comparison,
            r"diferencia|compar|\bmejor\b|\bvs\b|versus|\bcontra\b",
        ),
        (
            QueryClassification::ConversationalFollowup,
            r"^(y eso|y que mas|cuentame|dame mas|mas info|detalles|explica|amplia)|^y (el|la|los|las|en) ",
        ),
    ];

    table
        .into_iter()
        .map(|(tag, pattern)| (tag, Regex::new(pattern).expect("valid classifier regex")))
        .collect()
});

/// Reject empty, whitespace-only or oversize queries
pub fn validate_query(query_text: &str) -> Result<(), RetrievalError> {
    if query_text.trim().is_empty() {
        return Err(RetrievalError::invalid_input("query is empty"));
    }

    let len = char_len(query_text);
    if len > MAX_QUERY_CHARS {
        return Err(RetrievalError::invalid_input(format!(
            "query is {} characters, maximum is {}",
            len, MAX_QUERY_CHARS
        )));
    }

    Ok(())
}

/// Classify a raw user query
///
/// Pure and deterministic: the same text always yields the same tag.
pub fn classify(query_text: &str) -> Result<QueryClassification, RetrievalError> {
    validate_query(query_text)?;

    let normalized = normalize(query_text);

    if word_count(&normalized) <= MAX_GREETING_WORDS && GREETING.is_match(&normalized) {
        return Ok(QueryClassification::Greeting);
    }

    Ok(RULES
        .iter()
        .find(|(_, pattern)| pattern.is_match(&normalized))
        .map(|(tag, _)| *tag)
        .unwrap_or_default())
}
