//! GLSL ES 3.00 sources for the two programs in the scene.

/// Vertex stage of the lit cube. Emits world-space position and normal.
pub const LIT_VERTEX_SHADER: &str = r#"#version 300 es
precision mediump float;

in vec3 vertexPosition;
in vec3 aNormal;

out vec3 Normal;
out vec3 FragPos;

uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;

void main() {
    FragPos = vec3(model * vec4(vertexPosition, 1.0));
    Normal = mat3(transpose(inverse(model))) * aNormal;
    gl_Position = projection * view * vec4(FragPos, 1.0);
}
"#;

/// Phong shading: ambient + diffuse + specular, tinted by `objectColor`.
pub const LIT_FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;

out vec4 outputColor;

in vec3 Normal;
in vec3 FragPos;

uniform vec3 lightPos;
uniform vec3 viewPos;
uniform vec3 lightColor;
uniform vec3 objectColor;

void main() {
    float ambientStrength = 0.1;
    vec3 ambient = ambientStrength * lightColor;

    vec3 norm = normalize(Normal);
    vec3 lightDir = normalize(lightPos - FragPos);
    float diff = max(dot(norm, lightDir), 0.0);
    vec3 diffuse = diff * lightColor;

    float specularStrength = 0.5;
    vec3 viewDir = normalize(viewPos - FragPos);
    vec3 reflectDir = reflect(-lightDir, norm);
    float spec = pow(max(dot(viewDir, reflectDir), 0.0), 32.0);
    vec3 specular = specularStrength * spec * lightColor;

    vec3 result = (ambient + diffuse + specular) * objectColor;
    outputColor = vec4(result, 1.0);
}
"#;

/// Vertex stage of the lamp. Position only.
pub const LAMP_VERTEX_SHADER: &str = r#"#version 300 es
precision mediump float;

in vec3 vertexPosition;

uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;

void main() {
    gl_Position = projection * view * model * vec4(vertexPosition, 1.0);
}
"#;

/// The lamp is drawn flat white.
pub const LAMP_FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;

out vec4 outputColor;

void main() {
    outputColor = vec4(1.0);
}
"#;
