use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use agent_adapters::keyvault::key_vault_store;
use agent_adapters::traits::{
    AdapterError, AdapterMetadata, AdapterResult, AdapterStream, InferenceChunk, InferenceRequest,
    ModelAdapter,
};
use agent_config::{
    ConfigStore, CredentialError, CredentialResult, Environment, PromptConfig, Prompter,
    SecretStore, Temperature,
};
use agent_kernel::{AdapterFactory, PipelineError, PipelineStage};
use agent_primitives::Credential;
use article_generator::cli::GenerateArgs;
use article_generator::commands::generate::{Services, execute};
use async_trait::async_trait;
use futures::stream;
use tempfile::{TempDir, tempdir};

struct EchoAdapter {
    metadata: AdapterMetadata,
    requests: Mutex<Vec<InferenceRequest>>,
    fail_status: Option<u16>,
}

#[async_trait]
impl ModelAdapter for EchoAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn infer(&self, request: InferenceRequest) -> AdapterResult<AdapterStream> {
        let answer = format!("answer {}", {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        });
        if let Some(status) = self.fail_status {
            return Err(AdapterError::Status {
                service: "Azure OpenAI",
                status,
                body: "{\"error\":\"denied\"}".into(),
            });
        }
        Ok(Box::pin(stream::once(async move { Ok(InferenceChunk::new(answer, true)) })))
    }
}

#[derive(Clone)]
struct Recorder {
    adapter: Arc<EchoAdapter>,
    keys: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn new(fail_status: Option<u16>) -> Self {
        Self {
            adapter: Arc::new(EchoAdapter {
                metadata: AdapterMetadata::new("fake", "gpt-4"),
                requests: Mutex::new(Vec::new()),
                fail_status,
            }),
            keys: Arc::default(),
        }
    }

    fn requests(&self) -> Vec<InferenceRequest> {
        self.adapter.requests.lock().unwrap().clone()
    }

    fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

impl AdapterFactory for Recorder {
    fn build(&self, credential: &Credential) -> AdapterResult<Arc<dyn ModelAdapter>> {
        self.keys.lock().unwrap().push(credential.expose().to_owned());
        let adapter: Arc<dyn ModelAdapter> = self.adapter.clone();
        Ok(adapter)
    }
}

#[derive(Default)]
struct FailingVault {
    calls: AtomicUsize,
}

#[async_trait]
impl SecretStore for FailingVault {
    async fn fetch_secret(&self, vault: &str, _secret: &str) -> CredentialResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CredentialError::secret_store(vault, "forbidden"))
    }
}

struct TypedKey(&'static str);

#[async_trait]
impl Prompter for TypedKey {
    async fn prompt_secret(&self, _message: &str) -> io::Result<String> {
        Ok(self.0.to_owned())
    }
}

struct Workspace {
    dir: TempDir,
    store: ConfigStore,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("agent_task_config.json"));
        Self { dir, store }
    }

    fn transcript(&self, text: &str) -> PathBuf {
        let path = self.dir.path().join("transcript.txt");
        std::fs::write(&path, text).unwrap();
        path
    }
}

fn args(transcript: Option<&Path>) -> GenerateArgs {
    GenerateArgs {
        transcript: transcript.map(Path::to_path_buf),
        temperature: Temperature::DEFAULT,
        sets: Vec::new(),
        save: false,
        output: None,
        no_prompt: true,
    }
}

fn services(
    recorder: &Recorder,
    vault: Arc<FailingVault>,
    prompter: Option<TypedKey>,
) -> Services<Recorder, TypedKey> {
    Services {
        factory: recorder.clone(),
        secrets: vault,
        prompter,
    }
}

fn pipeline_error(err: &anyhow::Error) -> &PipelineError {
    err.downcast_ref::<PipelineError>().expect("pipeline error")
}

#[tokio::test]
async fn generates_article_with_env_key() {
    let ws = Workspace::new();
    let transcript = ws.transcript("Speaker 1: welcome to the panel.");
    let env = Environment::from_pairs([("AZURE_OPENAI_API_KEY", "env-key")]);
    let recorder = Recorder::new(None);
    let mut out = Vec::new();

    let output = execute(
        &ws.store,
        args(Some(&transcript)),
        &env,
        services(&recorder, Arc::default(), None),
        &mut out,
    )
    .await
    .unwrap();

    assert_eq!(output.tasks().len(), 3);
    assert_eq!(String::from_utf8(out).unwrap(), "answer 4\n");
    assert_eq!(recorder.keys(), ["env-key"]);

    let requests = recorder.requests();
    assert_eq!(requests.len(), 4);
    assert_eq!(requests[0].max_output_tokens(), Some(5));
    assert!(requests[1].messages()[0]
        .content()
        .contains("Plan content for the topic: Speaker 1: welcome to the panel."));
    assert!(requests[3].messages()[0].content().contains("answer 3"));
}

#[tokio::test]
async fn missing_transcript_never_resolves_credentials() {
    let ws = Workspace::new();
    let env = Environment::from_pairs([("AZURE_KEY_VAULT_NAME", "contoso-kv")]);
    let recorder = Recorder::new(None);
    let vault = Arc::new(FailingVault::default());
    let mut out = Vec::new();

    let err = execute(
        &ws.store,
        args(None),
        &env,
        services(&recorder, vault.clone(), Some(TypedKey("typed"))),
        &mut out,
    )
    .await
    .unwrap_err();

    assert!(matches!(pipeline_error(&err), PipelineError::MissingTranscript));
    assert_eq!(vault.calls.load(Ordering::SeqCst), 0);
    assert!(recorder.requests().is_empty());
    assert!(out.is_empty());
}

#[tokio::test]
async fn vault_failure_falls_through_to_prompt() {
    let ws = Workspace::new();
    let transcript = ws.transcript("notes");
    let env = Environment::from_pairs([
        ("AZURE_OPENAI_API_KEY", "   "),
        ("AZURE_KEY_VAULT_NAME", "contoso-kv"),
    ]);
    let recorder = Recorder::new(None);
    let vault = Arc::new(FailingVault::default());
    let mut out = Vec::new();

    execute(
        &ws.store,
        args(Some(&transcript)),
        &env,
        services(&recorder, vault.clone(), Some(TypedKey("typed-key"))),
        &mut out,
    )
    .await
    .unwrap();

    assert_eq!(vault.calls.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.keys(), ["typed-key"]);
}

#[tokio::test]
async fn no_credential_blocks_generation() {
    let ws = Workspace::new();
    let transcript = ws.transcript("notes");
    let recorder = Recorder::new(None);
    let mut out = Vec::new();

    let err = execute(
        &ws.store,
        args(Some(&transcript)),
        &Environment::default(),
        services(&recorder, Arc::default(), None),
        &mut out,
    )
    .await
    .unwrap_err();

    assert_eq!(pipeline_error(&err).stage(), PipelineStage::Credential);
    assert_eq!(err.to_string(), "Please enter your Azure OpenAI API Key.");
    assert!(recorder.keys().is_empty());
}

#[tokio::test]
async fn probe_rejection_stops_before_the_crew() {
    let ws = Workspace::new();
    let transcript = ws.transcript("");
    let env = Environment::from_pairs([("AZURE_OPENAI_API_KEY", "bad-key")]);
    let recorder = Recorder::new(Some(401));
    let mut out = Vec::new();

    let err = execute(
        &ws.store,
        args(Some(&transcript)),
        &env,
        services(&recorder, Arc::default(), None),
        &mut out,
    )
    .await
    .unwrap_err();

    let err = pipeline_error(&err);
    assert_eq!(err.stage(), PipelineStage::Connectivity);
    assert_eq!(err.status_code(), Some(401));
    assert_eq!(err.response_body(), Some("{\"error\":\"denied\"}"));
    assert_eq!(recorder.requests().len(), 1);
}

#[tokio::test]
async fn session_edits_apply_and_save_only_when_asked() {
    let ws = Workspace::new();
    let transcript = ws.transcript("notes");
    let env = Environment::from_pairs([("AZURE_OPENAI_API_KEY", "k")]);
    let output_path = ws.dir.path().join("article.md");

    let recorder = Recorder::new(None);
    let mut edited = args(Some(&transcript));
    edited.sets = vec![("editor.role".parse().unwrap(), "Copy Chief".to_owned())];
    execute(&ws.store, edited, &env, services(&recorder, Arc::default(), None), &mut Vec::new())
        .await
        .unwrap();

    assert!(recorder.requests()[3]
        .system_prompt()
        .unwrap()
        .starts_with("You are Copy Chief."));
    assert!(ws.store.load().await.unwrap().is_none());

    let recorder = Recorder::new(None);
    let mut saved = args(Some(&transcript));
    saved.sets = vec![("tasks.write".parse().unwrap(), "Write a brief".to_owned())];
    saved.save = true;
    saved.output = Some(output_path.clone());
    let mut out = Vec::new();
    execute(&ws.store, saved, &env, services(&recorder, Arc::default(), None), &mut out)
        .await
        .unwrap();

    let persisted = ws.store.load().await.unwrap().unwrap();
    assert_eq!(persisted.get("tasks.write").unwrap(), "Write a brief");
    assert_eq!(persisted.get("editor.role").unwrap(), PromptConfig::default().get("editor.role").unwrap());
    assert!(out.is_empty());
    assert_eq!(std::fs::read_to_string(output_path).unwrap(), "answer 4");
}

#[tokio::test]
async fn save_refuses_to_replace_malformed_file() {
    let ws = Workspace::new();
    std::fs::write(ws.store.path(), "{ hand edited, not json").unwrap();
    let recorder = Recorder::new(None);

    let mut edited = args(None);
    edited.sets = vec![("tasks.plan".parse().unwrap(), "x".to_owned())];
    edited.save = true;
    let err = execute(
        &ws.store,
        edited,
        &Environment::default(),
        services(&recorder, Arc::default(), None),
        &mut Vec::new(),
    )
    .await
    .unwrap_err();

    assert!(format!("{err:#}").contains("malformed configuration"), "{err:#}");
    assert_eq!(
        std::fs::read_to_string(ws.store.path()).unwrap(),
        "{ hand edited, not json"
    );
    assert!(recorder.requests().is_empty());
}

#[tokio::test]
async fn malformed_file_without_save_runs_on_defaults() {
    let ws = Workspace::new();
    std::fs::write(ws.store.path(), "{ hand edited, not json").unwrap();
    let transcript = ws.transcript("notes");
    let env = Environment::from_pairs([("AZURE_OPENAI_API_KEY", "k")]);
    let recorder = Recorder::new(None);

    execute(
        &ws.store,
        args(Some(&transcript)),
        &env,
        services(&recorder, Arc::default(), None),
        &mut Vec::new(),
    )
    .await
    .unwrap();

    assert!(recorder.requests()[1]
        .system_prompt()
        .unwrap()
        .starts_with("You are Content Planner."));
    assert_eq!(
        std::fs::read_to_string(ws.store.path()).unwrap(),
        "{ hand edited, not json"
    );
}

fn misconfigured_identity(extra: &[(&'static str, &'static str)]) -> Environment {
    let mut pairs = vec![
        ("AZURE_TENANT_ID", "tenant"),
        ("AZURE_CLIENT_ID", "client"),
        ("AZURE_CLIENT_SECRET", "secret"),
        ("AZURE_AUTHORITY_HOST", "not a url"),
    ];
    pairs.extend_from_slice(extra);
    Environment::from_pairs(pairs)
}

#[tokio::test]
async fn bad_identity_settings_do_not_block_env_key() {
    let ws = Workspace::new();
    let transcript = ws.transcript("notes");
    let env = misconfigured_identity(&[("AZURE_OPENAI_API_KEY", "real-key")]);
    let recorder = Recorder::new(None);

    let azure = Services::azure(&env, false);
    let services = Services {
        factory: recorder.clone(),
        secrets: azure.secrets,
        prompter: None::<TypedKey>,
    };
    execute(&ws.store, args(Some(&transcript)), &env, services, &mut Vec::new())
        .await
        .unwrap();

    assert_eq!(recorder.keys(), ["real-key"]);
}

#[tokio::test]
async fn bad_identity_settings_fall_through_to_prompt() {
    let ws = Workspace::new();
    let transcript = ws.transcript("notes");
    let env = misconfigured_identity(&[("AZURE_KEY_VAULT_NAME", "contoso-kv")]);
    let recorder = Recorder::new(None);

    let services = Services {
        factory: recorder.clone(),
        secrets: key_vault_store(&env),
        prompter: Some(TypedKey("typed-key")),
    };
    execute(&ws.store, args(Some(&transcript)), &env, services, &mut Vec::new())
        .await
        .unwrap();

    assert_eq!(recorder.keys(), ["typed-key"]);
}
