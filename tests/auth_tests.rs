use resolution_client::auth::RegisterData;
use resolution_client::error::Error;
use resolution_client::Resolution;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn users() -> serde_json::Value {
    json!([
        {"id": 1, "first_name": "Ana", "last_name": "Pérez", "email": "ana@example.com", "verified": 0},
        {"id": 2, "first_name": "Luis", "last_name": "Gómez", "email": "luis@example.com", "verified": 1}
    ])
}

#[tokio::test]
async fn test_register() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/user"))
        .and(body_json(json!({
            "first_name": "Ana",
            "last_name": "Pérez",
            "email": "ana@example.com",
            "password": "secreto1"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 1, "first_name": "Ana", "last_name": "Pérez",
            "email": "ana@example.com", "verified": 0
        })))
        .mount(&mock_server)
        .await;

    let resolution = Resolution::new(&mock_server.uri());
    let user = resolution
        .auth()
        .register(&RegisterData {
            first_name: "Ana".into(),
            last_name: "Pérez".into(),
            email: "ana@example.com".into(),
            password: "secreto1".into(),
            phone: None,
        })
        .await
        .unwrap();

    assert_eq!(user.id, 1);
    assert!(!user.verified);
}

#[tokio::test]
async fn test_register_duplicate_email_surfaces_server_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "Ya existe un usuario con este correo electrónico"
        })))
        .mount(&mock_server)
        .await;

    let resolution = Resolution::new(&mock_server.uri());
    let err = resolution
        .auth()
        .register(&RegisterData {
            first_name: "Ana".into(),
            last_name: "Pérez".into(),
            email: "ana@example.com".into(),
            password: "secreto1".into(),
            phone: Some("5550001".into()),
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Ya existe un usuario con este correo electrónico");
}

#[tokio::test]
async fn test_login() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"email": "luis@example.com", "password": "secreto1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "abc123",
            "user": {"id": 2, "first_name": "Luis", "last_name": "Gómez",
                     "email": "luis@example.com", "verified": 1, "is_admin": true}
        })))
        .mount(&mock_server)
        .await;

    let resolution = Resolution::new(&mock_server.uri());
    let session = resolution
        .auth()
        .login("luis@example.com", "secreto1")
        .await
        .unwrap();

    assert_eq!(session.token, "abc123");
    assert!(session.user.is_admin);
}

#[tokio::test]
async fn test_login_error_inside_success_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "Credenciales inválidas"
        })))
        .mount(&mock_server)
        .await;

    let resolution = Resolution::new(&mock_server.uri());
    let err = resolution
        .auth()
        .login("luis@example.com", "mala")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Domain(ref msg) if msg == "Credenciales inválidas"));
}

#[tokio::test]
async fn test_verify_code_flags_user_verified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users()))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .and(body_json(json!({"user_id": 1, "code": "123456"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/user/1"))
        .and(body_json(json!({"verified": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "first_name": "Ana", "last_name": "Pérez",
            "email": "ana@example.com", "verified": 1
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolution = Resolution::new(&mock_server.uri());
    let user = resolution
        .auth()
        .verify_code("ana@example.com", "123456")
        .await
        .unwrap();

    assert!(user.verified);
}

#[tokio::test]
async fn test_wrong_code_reports_backend_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users()))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let resolution = Resolution::new(&mock_server.uri());
    let err = resolution
        .auth()
        .verify_code("ana@example.com", "000000")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Código de verificación incorrecto");
}

#[tokio::test]
async fn test_malformed_code_never_reaches_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users()))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let resolution = Resolution::new(&mock_server.uri());
    for code in ["12345", "1234567", "12a456", ""] {
        let err = resolution
            .auth()
            .verify_code("ana@example.com", code)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}

#[tokio::test]
async fn test_unknown_email() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users()))
        .mount(&mock_server)
        .await;

    let resolution = Resolution::new(&mock_server.uri());
    let err = resolution
        .auth()
        .resend_code("nadie@example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(err.to_string(), "Usuario no encontrado");
}

#[tokio::test]
async fn test_resend_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users()))
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/auth"))
        .and(body_json(json!({"user": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Código de verificación actualizado y enviado",
            "data": {"id": 5, "user": 1, "token": "654321"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolution = Resolution::new(&mock_server.uri());
    let envelope = resolution
        .auth()
        .resend_code("ANA@example.com")
        .await
        .unwrap();

    assert_eq!(envelope.data.unwrap().user, 1);
}

#[tokio::test]
async fn test_reset_password() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users()))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .and(body_json(json!({"user_id": 2, "code": "111222"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/user/2"))
        .and(body_json(json!({"password": "nuevaClave"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolution = Resolution::new(&mock_server.uri());
    resolution
        .auth()
        .reset_password("luis@example.com", "111222", "nuevaClave", "nuevaClave")
        .await
        .unwrap();

    let err = resolution
        .auth()
        .reset_password("luis@example.com", "111222", "nuevaClave", "otraClave")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Las contraseñas no coinciden");
}
