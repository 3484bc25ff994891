//! Registry of searchable collections and the per-collection field mapping
//! used to normalize their rows.

use serde::Serialize;

use crate::data_models::{Category, SearchTerm, fold_diacritics};
use crate::source::CollectionQuery;

/// Collection names as constants for consistency
pub mod collections {
    pub const VIDEOS: &str = "videoaulas";
    pub const SUMMARIES: &str = "resumos";
    pub const STATUTES: &str = "vade_mecum";
    pub const COMMENTED_ARTICLES: &str = "artigos_comentados";
    pub const AUDIO_LESSONS: &str = "audioaulas";
    pub const NEWS: &str = "noticias";
    pub const FLASHCARDS: &str = "flashcards";
    pub const LIBRARY: &str = "biblioteca";
    pub const EXAM_QUESTIONS: &str = "questoes";
    pub const BLOG: &str = "jusblog";
}

/// Keywords that unlock the blog collection.
pub const BLOG_KEYWORDS: [&str; 3] = ["jusblog", "blog", "juridico"];

#[derive(Debug, Clone, Serialize)]
pub struct SourceCollection {
    pub name: String,
    pub category: Category,
    pub label: String,
    pub title_field: String,
    pub body_field: String,
    pub category_field: Option<String>,
    pub order_by: Option<String>,
    /// When non-empty the collection is only queried if the folded term
    /// contains one of these keywords.
    pub required_keywords: Vec<String>,
}

impl SourceCollection {
    pub fn new(name: &str, category: Category, label: &str) -> Self {
        Self {
            name: name.to_string(),
            category,
            label: label.to_string(),
            title_field: "title".to_string(),
            body_field: "content".to_string(),
            category_field: None,
            order_by: None,
            required_keywords: Vec::new(),
        }
    }

    pub fn title(mut self, field: &str) -> Self {
        self.title_field = field.to_string();
        self
    }

    pub fn body(mut self, field: &str) -> Self {
        self.body_field = field.to_string();
        self
    }

    pub fn category_field(mut self, field: &str) -> Self {
        self.category_field = Some(field.to_string());
        self
    }

    pub fn order_by(mut self, field: &str) -> Self {
        self.order_by = Some(field.to_string());
        self
    }

    pub fn requires_keywords(mut self, keywords: &[&str]) -> Self {
        self.required_keywords = keywords.iter().map(|k| fold_diacritics(&k.to_lowercase())).collect();
        self
    }

    /// Whether this collection should be queried for `term` at all.
    pub fn accepts(&self, term: &SearchTerm) -> bool {
        if self.required_keywords.is_empty() {
            return true;
        }
        let folded = term.folded();
        self.required_keywords.iter().any(|k| folded.contains(k.as_str()))
    }

    pub fn query_for(&self, term: &SearchTerm, limit: usize) -> CollectionQuery {
        let mut fields = vec![self.title_field.clone(), self.body_field.clone()];
        if let Some(category_field) = &self.category_field {
            fields.push(category_field.clone());
        }
        CollectionQuery {
            collection: self.name.clone(),
            fields,
            pattern: term.as_str().to_string(),
            order_by: self.order_by.clone(),
            limit: (limit > 0).then_some(limit),
        }
    }
}

/// The built-in collections, in registration order.
pub fn default_registry() -> Vec<SourceCollection> {
    vec![
        SourceCollection::new(collections::VIDEOS, Category::Video, "Videoaula")
            .title("Aula")
            .body("Descrição")
            .category_field("Área")
            .order_by("Aula"),
        SourceCollection::new(collections::SUMMARIES, Category::Summary, "Resumo")
            .title("Tema")
            .body("Conteúdo")
            .category_field("Área")
            .order_by("Tema"),
        SourceCollection::new(collections::STATUTES, Category::Statute, "Vade Mecum")
            .title("Número do Artigo")
            .body("Artigo")
            .category_field("Código")
            .order_by("id"),
        SourceCollection::new(collections::COMMENTED_ARTICLES, Category::Article, "Artigo Comentado")
            .title("Título")
            .body("Comentário")
            .category_field("Área")
            .order_by("id"),
        SourceCollection::new(collections::AUDIO_LESSONS, Category::Audio, "Audioaula")
            .title("Título")
            .body("Descrição")
            .category_field("Área")
            .order_by("Título"),
        SourceCollection::new(collections::NEWS, Category::News, "Notícia")
            .title("Título")
            .body("Resumo")
            .category_field("Categoria")
            .order_by("data"),
        SourceCollection::new(collections::FLASHCARDS, Category::Flashcard, "Flashcard")
            .title("Pergunta")
            .body("Resposta")
            .category_field("Área")
            .order_by("id"),
        SourceCollection::new(collections::LIBRARY, Category::Book, "Biblioteca")
            .title("livro")
            .body("sobre")
            .category_field("área")
            .order_by("livro"),
        SourceCollection::new(collections::EXAM_QUESTIONS, Category::Flashcard, "Questão")
            .title("Enunciado")
            .body("Comentário")
            .category_field("Área")
            .order_by("id"),
        SourceCollection::new(collections::BLOG, Category::Blog, "JusBlog")
            .title("Título")
            .body("Conteúdo")
            .category_field("Categoria")
            .order_by("data")
            .requires_keywords(&BLOG_KEYWORDS),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog() -> SourceCollection {
        default_registry()
            .into_iter()
            .find(|c| c.name == collections::BLOG)
            .unwrap()
    }

    #[test]
    fn test_registry_has_ten_uniquely_named_collections() {
        let registry = default_registry();
        assert_eq!(registry.len(), 10);
        let mut names: Vec<_> = registry.iter().map(|c| c.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_blog_requires_keyword() {
        let blog = blog();
        assert!(!blog.accepts(&SearchTerm::parse("prescrição").unwrap()));
        assert!(blog.accepts(&SearchTerm::parse("jusblog atualização").unwrap()));
        assert!(blog.accepts(&SearchTerm::parse("Blog do professor").unwrap()));
        assert!(blog.accepts(&SearchTerm::parse("mundo JURÍDICO").unwrap()));
    }

    #[test]
    fn test_collections_without_keywords_accept_everything() {
        let videos = &default_registry()[0];
        assert!(videos.accepts(&SearchTerm::parse("prescrição").unwrap()));
    }

    #[test]
    fn test_query_includes_category_field_when_configured() {
        let term = SearchTerm::parse("contrato").unwrap();
        let with = SourceCollection::new("a", Category::Video, "A")
            .title("t")
            .body("b")
            .category_field("c");
        let without = SourceCollection::new("b", Category::Book, "B").title("t").body("b");

        assert_eq!(with.query_for(&term, 10).fields, vec!["t", "b", "c"]);
        assert_eq!(without.query_for(&term, 0).fields, vec!["t", "b"]);
        assert_eq!(without.query_for(&term, 0).limit, None);
        assert_eq!(with.query_for(&term, 10).limit, Some(10));
    }
}
