//! The sequencing pipeline: validate, build the graph, reject cycles, order,
//! place on the timeline, sample parallel partners, report.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::config::SequencingConfig;
use crate::cycle::ensure_acyclic;
use crate::error::{SequencingError, ValidationError};
use crate::graph::DependencyGraph;
use crate::log_changes;
use crate::metrics::{compile_warnings, compute_metrics};
use crate::models::{
    OptimizedTask, ScheduleRequest, ScheduleResponse, ScheduleResult, TaskRecord,
};
use crate::scheduler::{calendar_date, compute_timeline, parallel_partners, topological_order};
use crate::validation::validate_records;

/// Stateless sequencing engine. Every call builds and drops its own graph, so
/// one instance can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct TaskSequencer {
    config: SequencingConfig,
}

impl TaskSequencer {
    pub fn new(config: SequencingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SequencingConfig {
        &self.config
    }

    /// Sequence one batch.
    ///
    /// # Returns
    /// * `Ok(ScheduleResult)` with every task placed
    /// * `Err(SequencingError)` for invalid records, unresolved names under the
    ///   strict policy, cycles, or a broken internal invariant
    pub fn sequence(&self, request: &ScheduleRequest) -> Result<ScheduleResult, SequencingError> {
        let verbosity = self.config.verbosity;
        let goal = request.goal();

        let batch = validate_records(&request.tasks, &self.config)?;
        let tasks = batch.tasks;
        let mut engine_warnings = batch.warnings;

        let build = DependencyGraph::build(&tasks, self.config.unresolved_policy, verbosity)?;
        let graph = build.graph;
        engine_warnings.extend(build.warnings);

        ensure_acyclic(&graph, verbosity)?;

        let order = topological_order(&graph, &tasks, goal, verbosity)?;
        let slots = compute_timeline(&graph, &tasks, &order, verbosity)?;
        let partners = parallel_partners(
            &graph,
            &order,
            self.config.parallel_sample_limit,
            verbosity,
        );
        let metrics = compute_metrics(&graph, &tasks, &order, &slots);

        // Every task gets both dates or, without an anchor, neither.
        let dates: Vec<Option<(NaiveDate, NaiveDate)>> = slots
            .iter()
            .map(|slot| match request.start_date {
                None => Ok(None),
                Some(anchor) => calendar_date(anchor, slot.start_day)
                    .zip(calendar_date(anchor, slot.end_day))
                    .map(Some)
                    .ok_or_else(|| {
                        ValidationError::batch(
                            "start_date",
                            format!(
                                "{} plus {} days is past the last representable date",
                                anchor, slot.end_day
                            ),
                        )
                    }),
            })
            .collect::<Result<_, _>>()?;

        let optimized_tasks: Vec<OptimizedTask> = order
            .iter()
            .enumerate()
            .map(|(position, &node)| {
                let task = &tasks[node as usize];
                let slot = slots[node as usize];
                OptimizedTask {
                    id: task.id.clone(),
                    name: task.name.clone(),
                    sequence_order: position + 1,
                    start_day: slot.start_day,
                    end_day: slot.end_day,
                    duration_days: task.duration,
                    priority: task.priority,
                    parallel_tasks: partners[node as usize]
                        .iter()
                        .map(|&p| tasks[p as usize].name.clone())
                        .collect(),
                    start_date: dates[node as usize].map(|(start, _)| start),
                    end_date: dates[node as usize].map(|(_, end)| end),
                }
            })
            .collect();

        log_changes!(
            verbosity,
            "Sequenced {} tasks over {} days (goal={})",
            optimized_tasks.len(),
            metrics.total_duration_days,
            goal
        );

        Ok(ScheduleResult {
            optimized_tasks,
            total_duration_days: metrics.total_duration_days,
            optimization_goal: goal,
            efficiency_gain_percent: metrics.efficiency_gain_percent,
            warnings: compile_warnings(&request.constraints, engine_warnings, &metrics),
            critical_path: metrics
                .critical_path
                .iter()
                .map(|&node| tasks[node as usize].name.clone())
                .collect(),
            critical_path_days: metrics.critical_path_days,
        })
    }

    /// Sequence a JSON request and wrap the outcome in the response envelope.
    ///
    /// A request that does not decode is reported as a validation failure.
    pub fn sequence_json(&self, input: &str) -> ScheduleResponse {
        let outcome = decode_request(input)
            .map_err(SequencingError::from)
            .and_then(|request| self.sequence(&request));
        if let Err(err) = &outcome {
            tracing::debug!(error_type = err.error_type(), "sequencing rejected: {}", err);
        }
        ScheduleResponse::from(outcome)
    }
}

/// Decode a JSON request, naming the record and field of a mistyped task.
fn decode_request(input: &str) -> Result<ScheduleRequest, ValidationError> {
    let value: Value = serde_json::from_str(input)
        .map_err(|e| ValidationError::batch("request", e.to_string()))?;

    if let Some(records) = value.get("tasks").and_then(Value::as_array) {
        for (index, record) in records.iter().enumerate() {
            if let Err(e) = TaskRecord::deserialize(record) {
                let field = mistyped_field(record).unwrap_or("tasks");
                return Err(ValidationError::at(index, field, e.to_string()));
            }
        }
    }

    serde_json::from_value(value).map_err(|e| ValidationError::batch("request", e.to_string()))
}

/// First task-record field whose JSON value has the wrong type.
fn mistyped_field(record: &Value) -> Option<&'static str> {
    let fields = record.as_object()?;
    let is_string_list =
        |v: &Value| v.as_array().is_some_and(|items| items.iter().all(Value::is_string));
    let checks: [(&'static str, &dyn Fn(&Value) -> bool); 6] = [
        ("task_id", &Value::is_string),
        ("task_name", &Value::is_string),
        ("estimated_duration_days", &Value::is_number),
        ("priority", &Value::is_string),
        ("dependencies", &is_string_list),
        ("resources_required", &is_string_list),
    ];
    let mistyped = checks
        .into_iter()
        .find(|(field, fits)| fields.get(*field).is_some_and(|v| !v.is_null() && !fits(v)))
        .map(|(field, _)| field);
    mistyped
}

/// Sequence one batch with the given configuration.
pub fn sequence_tasks(
    request: &ScheduleRequest,
    config: &SequencingConfig,
) -> Result<ScheduleResult, SequencingError> {
    TaskSequencer::new(config.clone()).sequence(request)
}

/// Sequence a JSON request into the JSON-serializable response envelope.
pub fn run_json(input: &str, config: &SequencingConfig) -> ScheduleResponse {
    TaskSequencer::new(config.clone()).sequence_json(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnresolvedPolicy;
    use crate::models::{OptimizationGoal, TaskRecord};
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    fn sequence(tasks: Vec<TaskRecord>) -> Result<ScheduleResult, SequencingError> {
        sequence_tasks(&ScheduleRequest::new(tasks), &SequencingConfig::default())
    }

    fn to_json(response: &ScheduleResponse) -> Value {
        serde_json::to_value(response).unwrap()
    }

    /// A mid-sized farm plan with branches, joins and an isolated task.
    fn season_plan() -> Vec<TaskRecord> {
        vec![
            TaskRecord::new("t1", "Labour").duration(3.0).resources(["tracteur", "charrue"]),
            TaskRecord::new("t2", "Analyse sol").duration(1.0).priority("high"),
            TaskRecord::new("t3", "Amendement")
                .duration(2.0)
                .depends_on(["Analyse sol"])
                .resources(["épandeur"]),
            TaskRecord::new("t4", "Semis")
                .duration(2.0)
                .priority("critical")
                .depends_on(["Labour", "Amendement"])
                .resources(["semoir", "tracteur"]),
            TaskRecord::new("t5", "Irrigation").duration(1.0).depends_on(["Semis"]),
            TaskRecord::new("t6", "Désherbage")
                .duration(2.0)
                .priority("low")
                .depends_on(["Semis"]),
            TaskRecord::new("t7", "Réparation clôture").duration(4.0).priority("low"),
            TaskRecord::new("t8", "Récolte")
                .duration(3.0)
                .priority("critical")
                .depends_on(["Irrigation", "Désherbage"]),
        ]
    }

    #[test]
    fn test_scenario_a_branching_plan() {
        let result = sequence(vec![
            TaskRecord::new("t1", "Semis").duration(1.0),
            TaskRecord::new("t2", "Fertilisation").duration(1.0).depends_on(["Semis"]),
            TaskRecord::new("t3", "Traitement").duration(2.0).depends_on(["Semis"]),
        ])
        .unwrap();

        let semis = result.task("t1").unwrap();
        let fertilisation = result.task("t2").unwrap();
        let traitement = result.task("t3").unwrap();

        assert_eq!((semis.start_day, semis.end_day), (0, 1));
        assert_eq!((fertilisation.start_day, fertilisation.end_day), (1, 2));
        assert_eq!((traitement.start_day, traitement.end_day), (1, 3));
        assert_eq!(result.total_duration_days, 3);
        assert!(fertilisation.parallel_tasks.contains(&"Traitement".to_string()));
        assert!(traitement.parallel_tasks.contains(&"Fertilisation".to_string()));
        assert!(semis.parallel_tasks.is_empty());
        assert_eq!(result.efficiency_gain_percent, Some(25.0));
    }

    #[test]
    fn test_scenario_b_cycle_rejected() {
        let response = run_json(
            r#"{"tasks": [
                {"task_id": "a", "task_name": "A", "dependencies": ["B"]},
                {"task_id": "b", "task_name": "B", "dependencies": ["A"]}
            ]}"#,
            &SequencingConfig::default(),
        );
        let value = to_json(&response);

        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error_type"], json!("circular_dependency"));
        assert!(value.get("optimized_tasks").is_none());
    }

    #[test]
    fn test_scenario_c_missing_name() {
        let response = run_json(
            r#"{"tasks": [{"task_id": "t1", "estimated_duration_days": 2}]}"#,
            &SequencingConfig::default(),
        );
        let value = to_json(&response);

        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error_type"], json!("validation"));
        assert!(value["error"].as_str().unwrap().contains("task_name"));
        assert!(value.get("optimized_tasks").is_none());
    }

    #[test]
    fn test_scenario_d_single_task() {
        let result = sequence(vec![TaskRecord::new("t1", "Récolte").duration(5.0)]).unwrap();
        assert_eq!(result.total_duration_days, 5);
        assert_eq!(result.efficiency_gain_percent, Some(0.0));
        assert_eq!(result.optimized_tasks[0].sequence_order, 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_batch_succeeds() {
        let result = sequence(vec![]).unwrap();
        assert!(result.optimized_tasks.is_empty());
        assert_eq!(result.total_duration_days, 0);
        assert_eq!(result.efficiency_gain_percent, None);
    }

    #[test]
    fn test_order_respects_every_dependency() {
        let records = season_plan();
        let result = sequence(records.clone()).unwrap();
        let position = |name: &str| {
            result
                .optimized_tasks
                .iter()
                .position(|t| t.name == name)
                .unwrap()
        };

        for record in &records {
            let name = record.task_name.as_deref().unwrap();
            for dep in record.dependencies.iter().flatten() {
                assert!(position(dep) < position(name), "{} before {}", dep, name);
            }
        }

        let orders: Vec<usize> = result.optimized_tasks.iter().map(|t| t.sequence_order).collect();
        assert_eq!(orders, (1..=records.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_timeline_respects_every_dependency() {
        let records = season_plan();
        let result = sequence(records.clone()).unwrap();
        let by_name = |name: &str| result.optimized_tasks.iter().find(|t| t.name == name).unwrap();

        for record in &records {
            let task = by_name(record.task_name.as_deref().unwrap());
            assert_eq!(task.end_day, task.start_day + u64::from(task.duration_days));
            assert!(task.end_day > task.start_day);
            for dep in record.dependencies.iter().flatten() {
                assert!(task.start_day >= by_name(dep).end_day);
            }
        }

        let max_end = result.optimized_tasks.iter().map(|t| t.end_day).max().unwrap();
        assert_eq!(result.total_duration_days, max_end);
        // Labour(3) -> Semis(2) -> Désherbage(2) -> Récolte(3)
        assert_eq!(result.total_duration_days, 10);
        assert_eq!(
            result.critical_path,
            vec!["Labour", "Semis", "Désherbage", "Récolte"]
        );
        assert!(result.total_duration_days >= result.critical_path_days);
    }

    #[test]
    fn test_unrelated_tasks_list_each_other() {
        let result = sequence(season_plan()).unwrap();
        let cloture = result.task("t7").unwrap();
        assert_eq!(cloture.parallel_tasks.len(), 3);

        // Irrigation and Désherbage share Semis but neither needs the other
        let irrigation = result.task("t5").unwrap();
        let desherbage = result.task("t6").unwrap();
        assert!(irrigation.parallel_tasks.contains(&"Désherbage".to_string()));
        assert!(desherbage.parallel_tasks.contains(&"Irrigation".to_string()));
        assert!(!irrigation.parallel_tasks.contains(&"Semis".to_string()));
        assert!(result.optimized_tasks.iter().all(|t| t.parallel_tasks.len() <= 3));
    }

    #[test]
    fn test_goal_changes_order_but_not_timeline() {
        let records = season_plan();
        let mut request = ScheduleRequest::new(records.clone());
        let config = SequencingConfig::default();

        let mut timelines = Vec::new();
        for goal in ["time", "cost", "resources", "weather"] {
            request.optimization_goal = Some(goal.to_string());
            let result = sequence_tasks(&request, &config).unwrap();

            let position = |name: &str| {
                result
                    .optimized_tasks
                    .iter()
                    .position(|t| t.name == name)
                    .unwrap()
            };
            for record in &records {
                let name = record.task_name.as_deref().unwrap();
                for dep in record.dependencies.iter().flatten() {
                    assert!(
                        position(dep) < position(name),
                        "{}: {} before {}",
                        goal,
                        dep,
                        name
                    );
                }
            }

            let mut days: Vec<(String, u64, u64)> = result
                .optimized_tasks
                .iter()
                .map(|t| (t.id.clone(), t.start_day, t.end_day))
                .collect();
            days.sort();
            timelines.push((result.total_duration_days, days));
        }
        assert!(timelines.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_goal_echo_and_fallback() {
        let mut request = ScheduleRequest::new(vec![TaskRecord::new("t1", "Semis")]);
        request.optimization_goal = Some("yield".to_string());
        let result = sequence_tasks(&request, &SequencingConfig::default()).unwrap();
        assert_eq!(result.optimization_goal, OptimizationGoal::Time);

        request.optimization_goal = Some("resources".to_string());
        let result = sequence_tasks(&request, &SequencingConfig::default()).unwrap();
        assert_eq!(result.optimization_goal, OptimizationGoal::Resources);
    }

    #[test]
    fn test_deterministic() {
        let request = ScheduleRequest::new(season_plan());
        let config = SequencingConfig::default();
        let first = sequence_tasks(&request, &config).unwrap();
        for _ in 0..5 {
            assert_eq!(sequence_tasks(&request, &config).unwrap(), first);
        }
    }

    #[test]
    fn test_constraints_and_unresolved_in_warnings() {
        let mut request = ScheduleRequest::new(vec![
            TaskRecord::new("t1", "Semis"),
            TaskRecord::new("t2", "Irrigation").depends_on(["Semis", "Pompage"]),
            TaskRecord::new("t3", "Inspection"),
        ]);
        request.constraints = vec!["Sol gelé avant le 15 mars".to_string()];
        let result = sequence_tasks(&request, &SequencingConfig::default()).unwrap();

        assert_eq!(result.warnings[0], "Sol gelé avant le 15 mars");
        assert!(result.warnings[1].contains("Pompage"));
        assert!(result.warnings.last().unwrap().contains("faster"));
        // The dropped edge leaves Irrigation after Semis only
        assert_eq!(result.task("t2").unwrap().start_day, 1);
    }

    #[test]
    fn test_strict_policy_rejects_unresolved() {
        let config = SequencingConfig {
            unresolved_policy: UnresolvedPolicy::FailOnUnresolved,
            ..SequencingConfig::default()
        };
        let request = ScheduleRequest::new(vec![
            TaskRecord::new("t1", "Irrigation").depends_on(["Pompage"]),
        ]);
        let err = sequence_tasks(&request, &config).unwrap_err();
        assert_eq!(err.error_type(), "validation");
    }

    #[test]
    fn test_calendar_anchor() {
        let mut request = ScheduleRequest::new(vec![
            TaskRecord::new("t1", "Labour").duration(2.0),
            TaskRecord::new("t2", "Semis").depends_on(["Labour"]),
        ]);
        request.start_date = NaiveDate::from_ymd_opt(2025, 3, 30);
        let result = sequence_tasks(&request, &SequencingConfig::default()).unwrap();

        let semis = result.task("t2").unwrap();
        assert_eq!(semis.start_date, NaiveDate::from_ymd_opt(2025, 4, 1));
        assert_eq!(semis.end_date, NaiveDate::from_ymd_opt(2025, 4, 2));
    }

    #[test]
    fn test_calendar_overflow_is_rejected() {
        let mut request = ScheduleRequest::new(vec![
            TaskRecord::new("t1", "Jachère").duration(1e8),
            TaskRecord::new("t2", "Semis"),
        ]);
        assert!(sequence_tasks(&request, &SequencingConfig::default()).is_ok());

        request.start_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        match sequence_tasks(&request, &SequencingConfig::default()) {
            Err(SequencingError::Validation(err)) => {
                assert_eq!(err.field, "start_date");
                assert_eq!(err.index, None);
            }
            other => panic!("expected a start_date validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_success_envelope_shape() {
        let response = run_json(
            r#"{
                "tasks": [
                    {"task_id": "t1", "task_name": "Semis"},
                    {"task_id": "t2", "task_name": "Récolte", "dependencies": ["Semis"],
                     "estimated_duration_days": 2, "priority": "high",
                     "resources_required": ["moissonneuse"]}
                ],
                "optimization_goal": "cost",
                "constraints": ["Pluie prévue jeudi"]
            }"#,
            &SequencingConfig::default(),
        );
        assert!(response.is_success());
        let value = to_json(&response);

        assert_eq!(value["success"], json!(true));
        assert_eq!(value["optimization_goal"], json!("cost"));
        assert_eq!(value["total_duration_days"], json!(3));
        assert_eq!(value["efficiency_gain_percent"], json!(0.0));
        assert_eq!(value["warnings"], json!(["Pluie prévue jeudi"]));
        let recolte = &value["optimized_tasks"][1];
        assert_eq!(recolte["task_name"], json!("Récolte"));
        assert_eq!(recolte["sequence_order"], json!(2));
        assert_eq!(recolte["start_day"], json!(1));
        assert_eq!(recolte["priority"], json!("high"));
        assert!(recolte.get("start_date").is_none());
    }

    #[test]
    fn test_malformed_json_is_validation_failure() {
        let response = run_json("{\"tasks\": 3}", &SequencingConfig::default());
        assert!(!response.is_success());
        assert_eq!(to_json(&response)["error_type"], json!("validation"));
    }

    #[test]
    fn test_mistyped_record_names_index_and_field() {
        let response = run_json(
            r#"{"tasks": [
                {"task_id": "t1", "task_name": "Semis"},
                {"task_id": 5, "task_name": "Récolte"}
            ]}"#,
            &SequencingConfig::default(),
        );
        let value = to_json(&response);
        assert_eq!(value["error_type"], json!("validation"));
        let error = value["error"].as_str().unwrap();
        assert!(error.contains("Task 1 field 'task_id'"), "{}", error);
        assert!(!error.contains("line"), "{}", error);

        let response = run_json(
            r#"{"tasks": [{"task_id": "t1", "task_name": "Semis", "dependencies": ["Labour", 2]}]}"#,
            &SequencingConfig::default(),
        );
        let error = to_json(&response)["error"].as_str().unwrap().to_string();
        assert!(error.contains("Task 0 field 'dependencies'"), "{}", error);
    }
}
