pub mod onnx_face_analyzer;
pub mod onnx_pose_estimator;
pub mod yolo;
