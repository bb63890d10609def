//! Labs service models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct LabScenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub estimated_time: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub exercise_count: u32,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub external_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScenarioList {
    pub scenarios: Vec<LabScenario>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseProgress {
    pub exercise_id: u32,
    pub completed: bool,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub hints_used: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressList {
    pub progress: Vec<ExerciseProgress>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartScenario<'a> {
    pub user_id: &'a str,
    pub username: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseGrade {
    pub exercise_id: u32,
    pub exercise_title: String,
    pub challenges_completed: u32,
    pub challenges_required: u32,
    pub mitigation_score: Option<f64>,
    pub reflection_score: Option<f64>,
    pub overall_score: Option<f64>,
    pub completed: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioGrades {
    pub scenario_id: String,
    pub scenario_name: String,
    pub exercises: Vec<ExerciseGrade>,
    pub average_score: f64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGrades {
    pub user_id: String,
    pub username: String,
    pub scenarios: Vec<ScenarioGrades>,
    pub overall_average: f64,
    pub total_exercises_completed: u32,
    pub total_exercises_available: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabSummary {
    pub total_scenarios: u32,
    pub scenarios_started: u32,
    pub scenarios_completed: u32,
    pub total_exercises: u32,
    pub exercises_completed: u32,
    pub overall_completion_rate: f64,
    pub average_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grades_use_camel_case() {
        let body = r#"{
            "userId": "u1",
            "username": "neo",
            "scenarios": [{
                "scenarioId": "sql-injection",
                "scenarioName": "SQL Injection",
                "exercises": [{
                    "exerciseId": 1,
                    "exerciseTitle": "Login bypass",
                    "challengesCompleted": 2,
                    "challengesRequired": 3,
                    "mitigationScore": null,
                    "reflectionScore": 80.0,
                    "overallScore": 75.5,
                    "completed": false
                }],
                "averageScore": 75.5,
                "completionRate": 66.7
            }],
            "overallAverage": 75.5,
            "totalExercisesCompleted": 0,
            "totalExercisesAvailable": 1
        }"#;
        let grades: UserGrades = serde_json::from_str(body).unwrap();
        let ex = &grades.scenarios[0].exercises[0];
        assert_eq!(ex.exercise_title, "Login bypass");
        assert_eq!(ex.mitigation_score, None);
        assert_eq!(ex.reflection_score, Some(80.0));
    }

    #[test]
    fn test_scenario_defaults() {
        let list: ScenarioList =
            serde_json::from_str(r#"{"scenarios": [{"id": "xss", "name": "XSS"}]}"#).unwrap();
        assert_eq!(list.scenarios[0].exercise_count, 0);
        assert!(list.scenarios[0].skills.is_empty());
    }

    #[test]
    fn test_start_body() {
        let body = StartScenario {
            user_id: "u1",
            username: "neo",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"userId": "u1", "username": "neo"})
        );
    }
}
