//! Question catalogues.
//!
//! The Arena BRB survey is built in; other catalogues can be loaded from YAML
//! with the same shape:
//!
//! ```yaml
//! title: Arena Mais Verde
//! questions:
//!   - id: 0
//!     prompt: Como você se declara?
//!     options: [Mulher Cisgênero, Homem Cisgênero]
//!   - id: 1
//!     prompt: Qual próximo artista você gostaria de ver?
//!     kind: free-text
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::types::{Question, QuestionKind};

/// Validated, ordered list of questions.
///
/// Deserializing goes through the same checks as [`Questionnaire::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestionnaire")]
pub struct Questionnaire {
    #[serde(default)]
    pub title: String,
    questions: Vec<Question>,
}

/// Wire shape before validation.
#[derive(Deserialize)]
struct RawQuestionnaire {
    #[serde(default)]
    title: String,
    questions: Vec<Question>,
}

impl TryFrom<RawQuestionnaire> for Questionnaire {
    type Error = CatalogError;

    fn try_from(raw: RawQuestionnaire) -> Result<Self, Self::Error> {
        Self::validated(raw.title, raw.questions)
    }
}

impl Questionnaire {
    /// Build from questions whose ids run `0..N` in order.
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        Self::validated(String::new(), questions)
    }

    /// Load from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let raw: RawQuestionnaire = serde_yaml::from_str(yaml)?;
        raw.try_into()
    }

    pub fn to_yaml(&self) -> Result<String, CatalogError> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn validated(title: String, questions: Vec<Question>) -> Result<Self, CatalogError> {
        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (position, question) in questions.iter().enumerate() {
            if question.id != position {
                return Err(CatalogError::OrdinalGap {
                    position,
                    found: question.id,
                });
            }
            if question.kind != QuestionKind::FreeText && question.options.is_empty() {
                return Err(CatalogError::MissingOptions(question.id));
            }
        }
        Ok(Self { title, questions })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&Question> {
        self.questions.get(ordinal)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}

/// The ten questions of the Arena BRB survey.
pub fn arena_brb() -> Questionnaire {
    let questions = vec![
        Question::choice(
            0,
            "Como você se declara?",
            [
                "Mulher Cisgênero",
                "Mulher Trans",
                "Homem Cisgênero",
                "Homem Trans",
                "Prefiro não me informar",
            ],
        ),
        Question::choice(
            1,
            "Qual é a sua faixa etária?",
            [
                "Abaixo de 18 anos",
                "18 a 25 anos",
                "26 a 35 anos",
                "36 a 45 anos",
                "Acima de 45 anos",
            ],
        ),
        Question::choice(
            2,
            "Qual tipo de evento você participou na Arena BRB?",
            [
                "Shows/Festivais",
                "Evento Executivo",
                "Jogo de futebol",
                "Evento infantil",
                "Tour guiado",
            ],
        ),
        Question::choice(
            3,
            "Qual foi o principal meio de transporte que você utilizou para chegar à Arena BRB?",
            [
                "Carro Particular",
                "Aplicativo (Uber/99)",
                "Transporte Público",
                "Carona/Táxi",
                "Outro",
            ],
        ),
        Question::scale(
            4,
            "Em uma escala de 1 a 10, qual a chance de você recomendar a Arena BRB a um(a) amigo(a) ou colega?",
            1,
            10,
        ),
        Question::choice(
            5,
            "Encontrou o seu portão de entrada com a mesma facilidade que encontra a saída?",
            [
                "Extremamente Fácil",
                "Fácil",
                "Razoável",
                "Difícil",
                "Muito Difícil",
            ],
        ),
        Question::choice(
            6,
            "Se você pudesse dar um troféu, qual área da Arena merece destaque pela experiência que entregou?",
            [
                "Qualidade do Show/Jogo (O Evento principal)",
                "Atendimento do Staff e Segurança",
                "Limpeza e Banheiros",
                "Áreas de Alimentação (Bar/Stands)",
                "Estrutura (Sinalização, Wi-Fi, Acesso)",
                "Acessibilidade",
            ],
        ),
        Question::choice(
            7,
            "Para melhorar, qual dos itens abaixo gerou mais frustração ou atraso na sua experiência?",
            [
                "Estacionamento / Chegada",
                "Filas na Entrada",
                "Preços da Alimentação",
                "Tempo de Espera nos Banheiros",
                "Nada me frustrou",
            ],
        ),
        Question::choice(
            8,
            "Qual a sua vibe para o próximo evento no Arena BRB?",
            ["Amei!", "Já adquiri meu próximo ingresso", "Não voltarei"],
        ),
        Question::free_text(9, "Qual próximo artista você gostaria de ver no Arena BRB?"),
    ];

    Questionnaire {
        title: "Arena Mais Verde".to_string(),
        questions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_shape() {
        let catalog = arena_brb();
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.get(4).map(|q| q.kind), Some(QuestionKind::Scale));
        assert_eq!(catalog.get(9).map(|q| q.kind), Some(QuestionKind::FreeText));
        assert!(catalog.get(9).is_some_and(|q| q.options.is_empty()));
        // Same invariants the loader enforces
        assert!(Questionnaire::new(catalog.iter().cloned().collect()).is_ok());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
title: Pesquisa curta
questions:
  - id: 0
    prompt: Como você se declara?
    options: [Mulher Cisgênero, Homem Cisgênero]
  - id: 1
    prompt: Nota
    kind: scale
    options: ["1", "2", "3"]
  - id: 2
    prompt: Sugestões?
    kind: free-text
"#;
        let catalog = Questionnaire::from_yaml(yaml).unwrap();
        assert_eq!(catalog.title, "Pesquisa curta");
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(0).map(|q| q.kind), Some(QuestionKind::SingleChoice));
    }

    #[test]
    fn test_rejects_ordinal_gap() {
        let err = Questionnaire::new(vec![
            Question::free_text(0, "a"),
            Question::free_text(2, "b"),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::OrdinalGap { position: 1, found: 2 }));
    }

    #[test]
    fn test_rejects_choice_without_options() {
        let err = Questionnaire::new(vec![Question::choice(0, "a", Vec::<String>::new())])
            .unwrap_err();
        assert!(matches!(err, CatalogError::MissingOptions(0)));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(
            Questionnaire::new(Vec::new()),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn test_yaml_roundtrip_of_builtin() {
        let yaml = arena_brb().to_yaml().unwrap();
        assert_eq!(Questionnaire::from_yaml(&yaml).unwrap(), arena_brb());
    }

    #[test]
    fn test_yaml_roundtrip_keeps_subtitle() {
        let catalog = Questionnaire::new(vec![
            Question::scale(0, "De 1 a 10, quanto você recomendaria?", 1, 10)
                .with_subtitle("1 = nada provável, 10 = muito provável"),
            Question::free_text(1, "Sugestões?"),
        ])
        .unwrap();

        let yaml = catalog.to_yaml().unwrap();
        let loaded = Questionnaire::from_yaml(&yaml).unwrap();
        assert_eq!(
            loaded.get(0).and_then(|q| q.subtitle.as_deref()),
            Some("1 = nada provável, 10 = muito provável")
        );
        assert!(loaded.get(1).is_some_and(|q| q.subtitle.is_none()));
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn test_every_deserializer_validates() {
        let gap = r#"{"questions": [
            {"id": 0, "prompt": "a", "kind": "free-text"},
            {"id": 2, "prompt": "b", "kind": "free-text"}
        ]}"#;
        let err = serde_json::from_str::<Questionnaire>(gap).unwrap_err();
        assert!(err.to_string().contains("Question at position 1 has id 2"));

        let no_options = r#"{"questions": [{"id": 0, "prompt": "a"}]}"#;
        assert!(serde_json::from_str::<Questionnaire>(no_options).is_err());
        assert!(serde_json::from_str::<Questionnaire>(r#"{"questions": []}"#).is_err());

        let json = serde_json::to_string(&arena_brb()).unwrap();
        assert_eq!(serde_json::from_str::<Questionnaire>(&json).unwrap(), arena_brb());
    }

    #[test]
    fn test_from_yaml_reports_validation_errors() {
        let yaml = "questions:\n  - id: 1\n    prompt: a\n    kind: free-text\n";
        assert!(matches!(
            Questionnaire::from_yaml(yaml),
            Err(CatalogError::OrdinalGap { position: 0, found: 1 })
        ));
    }
}
