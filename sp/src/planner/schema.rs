//! Output schema the model is forced to fill in

use serde_json::json;

use crate::llm::ToolDefinition;

/// Function the model must call
pub const TOOL_NAME: &str = "generate_study_plan";

const TOOL_DESCRIPTION: &str = "Generate a structured weekly study plan with focus tips and burnout warnings";

/// Tool definition whose parameters mirror `StudyPlanResponse`
pub fn study_plan_tool() -> ToolDefinition {
    ToolDefinition::new(
        TOOL_NAME,
        TOOL_DESCRIPTION,
        json!({
            "type": "object",
            "properties": {
                "overview": {
                    "type": "string",
                    "description": "A 1-2 sentence overview of the study plan strategy"
                },
                "weeklyPlan": {
                    "type": "array",
                    "description": "Array of daily study plans for the week",
                    "items": {
                        "type": "object",
                        "properties": {
                            "day": {
                                "type": "string",
                                "description": "Day name (e.g., 'Monday', 'Tuesday')"
                            },
                            "tasks": {
                                "type": "array",
                                "items": { "type": "string" },
                                "description": "List of specific study tasks for this day"
                            },
                            "studyHours": {
                                "type": "number",
                                "description": "Total study hours for this day"
                            }
                        },
                        "required": ["day", "tasks", "studyHours"]
                    }
                },
                "focusTips": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "3-5 practical focus techniques for the student"
                },
                "burnoutWarnings": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Warnings about potential burnout risks and how to avoid them (empty array if no concerns)"
                },
                "motivation": {
                    "type": "string",
                    "description": "A personalized motivational message for the student"
                }
            },
            "required": ["overview", "weeklyPlan", "focusTips", "burnoutWarnings", "motivation"]
        }),
    )
}
