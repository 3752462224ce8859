//! Built-in templates for fully managed files.

pub const TLS_VHOST: &str = "apache/httpd-ssl.conf.tera";
pub const DIRECTORY_INDEX: &str = "apache/htaccess.tera";
pub const RUNTIME_TUNING: &str = "php/php.ini.tera";
pub const CERT_REQUEST: &str = "openssl/request.cnf.tera";

const TLS_VHOST_BODY: &str = r#"Listen {{ port }}

<VirtualHost *:{{ port }}>
    SSLEngine on
    SSLCertificateFile {{ certificate }}
    SSLCertificateKeyFile {{ private_key }}
    SSLProtocol all -SSLv3 -TLSv1 -TLSv1.1
    SSLCipherSuite HIGH:!aNULL:!MD5
    SSLHonorCipherOrder on

    ServerAdmin admin@localhost
    DocumentRoot "{{ document_root }}"

    <Directory "{{ document_root }}">
        Options Indexes FollowSymLinks
        AllowOverride All
        Require all granted
    </Directory>
</VirtualHost>
"#;

const DIRECTORY_INDEX_BODY: &str = r#"# Precedence is from left to right
# .php will be preferred
DirectoryIndex {{ index_files | join(sep=" ") }}
"#;

const RUNTIME_TUNING_BODY: &str = r#"; Upload limits
upload_max_filesize = {{ upload_max_filesize }}
post_max_size = {{ post_max_size }}

; Memory and execution limits
memory_limit = {{ memory_limit }}
max_execution_time = {{ max_execution_time }}

; Error display
error_reporting = {{ error_reporting }}
display_errors = {% if display_errors %}On{% else %}Off{% endif %}
"#;

const CERT_REQUEST_BODY: &str = r#"[req]
distinguished_name = req_distinguished_name
x509_extensions = v3_req
prompt = no
default_bits = {{ key_bits }}
default_md = sha256

[req_distinguished_name]
C = {{ subject.country }}
ST = {{ subject.state }}
L = {{ subject.locality }}
O = {{ subject.organization }}
OU = {{ subject.organizational_unit }}
CN = {{ subject.common_name }}

[v3_req]
basicConstraints = CA:FALSE
keyUsage = digitalSignature, keyEncipherment, nonRepudiation
extendedKeyUsage = serverAuth, clientAuth
subjectKeyIdentifier = hash
authorityKeyIdentifier = keyid,issuer
subjectAltName = @alt_names

[alt_names]
{% for name in subject.dns_names %}DNS.{{ loop.index }} = {{ name }}
{% endfor %}{% for ip in subject.ip_addresses %}IP.{{ loop.index }} = {{ ip }}
{% endfor %}"#;

/// `(name, body)` pairs registered by the engine.
pub fn all() -> Vec<(&'static str, &'static str)> {
    vec![
        (TLS_VHOST, TLS_VHOST_BODY),
        (DIRECTORY_INDEX, DIRECTORY_INDEX_BODY),
        (RUNTIME_TUNING, RUNTIME_TUNING_BODY),
        (CERT_REQUEST, CERT_REQUEST_BODY),
    ]
}
