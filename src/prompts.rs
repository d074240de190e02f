//! Prompt templates and context formatting (French).

use crate::types::{keys, Chunk, MetaValue};

pub const RAG_SYSTEM_PROMPT: &str = "Tu es un assistant expert en rapports institutionnels français \
(Cour des comptes, IGF, CGE, IGAS, IGA, etc.).

Tu as accès à des extraits de rapports officiels. Réponds à la question de l'utilisateur \
en te basant UNIQUEMENT sur ces extraits.

Règles importantes :
1. Si l'information n'est pas dans les extraits, dis-le clairement, sans inventer.
2. Cite tes sources : mentionne l'institution, l'année et, si disponible, le titre de section.
3. Sois précis et concis. Utilise le style factuel des rapports administratifs.
4. Si plusieurs rapports donnent des informations contradictoires, mentionne-le.

Extraits disponibles :
{context}
";

pub const RAG_USER_PROMPT: &str = "Question : {question}";

pub const SYNTHESIS_SYSTEM_PROMPT: &str = "Tu es un assistant expert en politiques publiques françaises.

Tu dois synthétiser ce que disent plusieurs rapports institutionnels sur un même sujet.

Structure ta réponse ainsi :
1. **Principaux constats** : ce sur quoi les rapports s'accordent
2. **Nuances et divergences** : points de désaccord ou d'évolution dans le temps
3. **Recommandations clés** : les recommandations les plus importantes

Base-toi UNIQUEMENT sur les extraits fournis. Cite les sources.

Extraits :
{context}
";

pub const SYNTHESIS_USER_PROMPT: &str = "Sujet à synthétiser : {question}";

pub const REDACTION_SYSTEM_PROMPT: &str = "Tu es un rapporteur d'un corps d'inspection ou de contrôle.

Tu rédiges une partie de rapport à partir des notes de terrain de l'équipe, en t'appuyant \
sur les extraits de rapports antérieurs pour le contexte, les chiffres et les recommandations \
déjà formulées.

Règles :
1. Adopte le style des rapports administratifs : phrases factuelles, paragraphes courts.
2. Les notes de terrain priment ; les extraits servent à les situer et à les étayer.
3. Cite les rapports antérieurs que tu mobilises (institution, année).
4. N'invente aucun chiffre absent des notes et des extraits.

Extraits de rapports antérieurs :
{context}
";

pub const REDACTION_USER_PROMPT: &str = "Partie à rédiger : {question}

Notes de terrain :
{notes}";

/// Returned instead of calling the model when the search finds nothing.
pub const NO_RESULTS_MESSAGE: &str = "Aucun document trouvé pour ces critères.\n\
Conseil : élargis les filtres ou vérifie que des rapports sont bien indexés.";

const EXTRACT_SEPARATOR: &str = "\n\n---\n\n";

fn non_empty(value: Option<&MetaValue>) -> Option<String> {
    match value? {
        MetaValue::Text(s) if s.trim().is_empty() => None,
        MetaValue::Int(0) => None,
        other => Some(other.to_string()),
    }
}

/// Citation line for one chunk, e.g. `IGF "Les jetons" (2023) — Section : SYNTHÈSE p. 4`.
pub fn source_line(chunk: &Chunk) -> String {
    let meta = &chunk.metadata;
    let mut parts = Vec::new();
    if let Some(institution) = non_empty(meta.get(keys::INSTITUTION)) {
        parts.push(institution);
    }
    if let Some(title) = non_empty(meta.get(keys::TITLE)) {
        parts.push(format!("\"{}\"", title));
    }
    if let Some(year) = non_empty(meta.get(keys::YEAR)) {
        parts.push(format!("({})", year));
    }
    if let Some(section) = non_empty(meta.get(keys::SECTION)) {
        parts.push(format!("— Section : {}", section));
    }
    if let Some(page) = non_empty(meta.get(keys::PAGE)) {
        parts.push(format!("p. {}", page));
    }

    if parts.is_empty() {
        "Source inconnue".to_string()
    } else {
        parts.join(" ")
    }
}

/// Render retrieved chunks as numbered extracts the model can cite.
pub fn format_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "[Extrait {}]\nSource : {}\n\n{}",
                i + 1,
                source_line(chunk),
                chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join(EXTRACT_SEPARATOR)
}

/// Substitute `{context}`, `{question}` and `{notes}` in a template.
///
/// Single pass: placeholders inside the substituted values are left as is.
pub fn render(template: &str, context: &str, question: &str, notes: &str) -> String {
    let values = [
        ("{context}", context),
        ("{question}", question),
        ("{notes}", notes),
    ];
    let mut out = String::with_capacity(template.len() + context.len() + question.len());
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match values.iter().find(|(placeholder, _)| tail.starts_with(placeholder)) {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
