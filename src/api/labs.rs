//! Labs service API (scenarios, progress, grades)

use super::client::{read_json, ApiClient};
use super::error::ApiError;
use crate::models::{
    ExerciseProgress, LabScenario, LabSummary, ProgressList, ScenarioList, StartScenario,
    UserGrades,
};

pub async fn get_scenarios(client: &ApiClient) -> Result<Vec<LabScenario>, ApiError> {
    let resp = client.get("/scenarios").await?;
    let list: ScenarioList = read_json(resp).await?;
    Ok(list.scenarios)
}

pub async fn get_scenario(client: &ApiClient, scenario_id: &str) -> Result<LabScenario, ApiError> {
    let resp = client
        .get(&format!("/scenarios/{}", urlencoding::encode(scenario_id)))
        .await?;
    read_json(resp).await
}

/// Start a scenario; the username is only for display on the labs side.
pub async fn start_scenario(
    client: &ApiClient,
    scenario_id: &str,
    user_id: &str,
    username: &str,
) -> Result<serde_json::Value, ApiError> {
    let path = format!("/scenarios/{}/start", urlencoding::encode(scenario_id));
    let resp = client
        .post_json(&path, &StartScenario { user_id, username })
        .await?;
    read_json(resp).await
}

pub async fn get_user_progress(
    client: &ApiClient,
    user_id: &str,
    scenario_id: Option<&str>,
) -> Result<Vec<ExerciseProgress>, ApiError> {
    let path = format!("/users/{}/progress", urlencoding::encode(user_id));
    let resp = match scenario_id {
        Some(id) => client.get_query(&path, &[("scenarioId", id)]).await?,
        None => client.get(&path).await?,
    };
    let list: ProgressList = read_json(resp).await?;
    Ok(list.progress)
}

pub async fn get_user_grades(
    client: &ApiClient,
    user_id: &str,
    username: &str,
) -> Result<UserGrades, ApiError> {
    let path = format!("/grades/user/{}", urlencoding::encode(user_id));
    let resp = client.get_query(&path, &[("username", username)]).await?;
    read_json(resp).await
}

pub async fn get_lab_summary(client: &ApiClient, user_id: &str) -> Result<LabSummary, ApiError> {
    let path = format!("/grades/user/{}/summary", urlencoding::encode(user_id));
    let resp = client.get(&path).await?;
    read_json(resp).await
}
