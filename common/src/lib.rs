use serde::{Deserialize, Serialize};

/// A vacancy that passed every configured filter, as written to the output file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Vacancy {
    #[serde(rename = "Ссылка")]
    pub link: String,
    #[serde(rename = "Зарплата")]
    pub salary: String,
    #[serde(rename = "Наименование компании")]
    pub company: String,
    #[serde(rename = "Город")]
    pub city: String,
}

/// Fields read from a vacancy detail page besides the salary.
///
/// The title is collected for logging only and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VacancyInfo {
    pub title: String,
    pub company: String,
    pub city: String,
}

impl Vacancy {
    pub fn new(link: String, salary: String, info: VacancyInfo) -> Self {
        Self {
            link,
            salary,
            company: info.company,
            city: info.city,
        }
    }
}
