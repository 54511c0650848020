use crate::config::FlowConfig;
use crate::langflow::{ExtractedAnswer, FlowInvoker, extract_answer};
use crate::prompts::{MacroForm, PlanForm, ValidationError};

/// The two flows behind the fitness panels.
///
/// Validation runs before anything touches the network; a form that fails it
/// never reaches the invoker.
pub struct Coach {
    invoker: FlowInvoker,
    macro_flow: FlowConfig,
    plan_flow: FlowConfig,
}

impl Coach {
    pub fn new(invoker: FlowInvoker, macro_flow: FlowConfig, plan_flow: FlowConfig) -> Self {
        Self {
            invoker,
            macro_flow,
            plan_flow,
        }
    }

    #[tracing::instrument(skip_all, fields(flow = "macros"))]
    pub async fn recommend_macros(
        &self,
        form: &MacroForm,
    ) -> Result<ExtractedAnswer, ValidationError> {
        form.validate()?;
        Ok(self.ask(&self.macro_flow, &form.build_prompt()).await)
    }

    #[tracing::instrument(skip_all, fields(flow = "plan"))]
    pub async fn personalized_plan(
        &self,
        form: &PlanForm,
    ) -> Result<ExtractedAnswer, ValidationError> {
        form.validate()?;
        Ok(self.ask(&self.plan_flow, &form.build_prompt()).await)
    }

    async fn ask(&self, flow: &FlowConfig, prompt: &str) -> ExtractedAnswer {
        let raw = self.invoker.invoke(flow, prompt).await;
        let answer = extract_answer(&raw.to_value());
        if answer.is_error() {
            tracing::warn!("could not extract an answer from the workflow response");
        }
        answer
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Config;
    use crate::langflow::client::InvocationRequest;
    use crate::langflow::{FlowTransport, TransportResponse};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;

    /// Records every outbound call and answers with a fixed body.
    pub(crate) struct CountingTransport {
        body: String,
        pub(crate) calls: StdMutex<Vec<(String, String)>>,
    }

    impl CountingTransport {
        pub(crate) fn new(body: &str) -> Self {
            Self {
                body: body.to_string(),
                calls: StdMutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl FlowTransport for CountingTransport {
        async fn post_json(
            &self,
            url: &str,
            _bearer_token: &str,
            body: &InvocationRequest<'_>,
        ) -> anyhow::Result<TransportResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), body.input_value.to_string()));
            Ok(TransportResponse {
                status: 200,
                body: self.body.clone(),
            })
        }
    }

    pub(crate) fn coach_with(transport: Arc<CountingTransport>) -> Coach {
        let secrets = HashMap::from([
            ("APPLICATION_TOKEN_1".to_string(), "t1".to_string()),
            ("APPLICATION_TOKEN_2".to_string(), "t2".to_string()),
        ]);
        let config = Config::from_raw_values(None, None, None, Some("http://flows.test"), None);
        Coach::new(
            FlowInvoker::new(transport),
            config.macro_flow(&secrets).unwrap(),
            config.plan_flow(&secrets).unwrap(),
        )
    }

    pub(crate) fn message_body(message: &str) -> String {
        json!({ "outputs": [{ "messages": [{ "message": message }] }] }).to_string()
    }

    #[tokio::test]
    async fn test_blank_macro_form_never_calls_transport() {
        let transport = Arc::new(CountingTransport::new(&message_body("unused")));
        let coach = coach_with(transport.clone());

        let form = MacroForm {
            profile: "   ".to_string(),
            goals: "cut".to_string(),
            notes: String::new(),
        };
        let err = coach.recommend_macros(&form).await.unwrap_err();

        assert_eq!(err, ValidationError::MissingProfileOrGoals);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_plan_form_never_calls_transport() {
        let transport = Arc::new(CountingTransport::new(&message_body("unused")));
        let coach = coach_with(transport.clone());

        let err = coach
            .personalized_plan(&PlanForm {
                detailed_profile: "\n\t".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err, ValidationError::MissingDetailedProfile);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_macros_routes_to_macro_endpoint() {
        let transport = Arc::new(CountingTransport::new(&message_body(
            "```json\n{\"calories\": 2200}\n```",
        )));
        let coach = coach_with(transport.clone());

        let form = MacroForm {
            profile: "Ana, 29".to_string(),
            goals: "maintain".to_string(),
            notes: "vegan".to_string(),
        };
        let answer = coach.recommend_macros(&form).await.unwrap();

        assert_eq!(answer, ExtractedAnswer::Json(json!({ "calories": 2200 })));
        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.ends_with("/api/v1/run/Macro"));
        assert!(calls[0].1.contains("Profile: Ana, 29\nGoals: maintain\nAdditional Notes: vegan"));
    }

    #[tokio::test]
    async fn test_plan_routes_to_flow_id() {
        let transport = Arc::new(CountingTransport::new(&message_body("Train 3x a week.")));
        let coach = coach_with(transport.clone());

        let answer = coach
            .personalized_plan(&PlanForm {
                detailed_profile: "Desk job, 70kg".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(answer, ExtractedAnswer::Text("Train 3x a week.".to_string()));
        let calls = transport.calls.lock().unwrap();
        assert!(calls[0].0.ends_with("/api/v1/run/3e774dd8-0d0f-4006-93ca-fd14e2bcf0cb"));
        assert!(calls[0].1.ends_with("\n\nDesk job, 70kg"));
    }

    #[tokio::test]
    async fn test_decode_failure_surfaces_as_extraction_error_with_payload() {
        let transport = Arc::new(CountingTransport::new("not json at all"));
        let coach = coach_with(transport);

        let answer = coach
            .personalized_plan(&PlanForm {
                detailed_profile: "anything".to_string(),
            })
            .await
            .unwrap();

        match answer {
            ExtractedAnswer::Error {
                details, response, ..
            } => {
                assert_eq!(details, "Key 'outputs' not found in response");
                assert_eq!(response["error"], "Failed to decode JSON in API 2");
                assert_eq!(response["response_text"], "not json at all");
            }
            other => panic!("expected extraction error, got {other:?}"),
        }
    }
}
